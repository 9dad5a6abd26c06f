//! Typed block model of an nginx configuration document.
//!
//! [`Document::parse`] scans the file line by line and produces an ordered
//! sequence of [`Block`]s. Only the shapes this system generates (plus the
//! hand-authored skeleton anchors) are modelled; every other line run is
//! kept verbatim as [`Block::Opaque`]. Rendering the sequence reproduces
//! the input byte for byte, so edits are splices of the block list rather
//! than string-region guesses.
//!
//! # Recognised shapes
//!
//! ```text
//! # Upstream for https://api.anthropic.com     <- origin annotation
//! upstream api_anthropic_com_upstream {        <- Block::Upstream
//!     server api.anthropic.com:443;
//!     keepalive 32;
//! }
//!
//! # Claude                                     <- display annotation
//! location /claude/ {                          <- Block::Location
//!     proxy_pass https://api_anthropic_com_upstream;
//!     ...
//! }
//!
//! #     location /claude/ {                    <- Block::DisabledLocation
//! #         ...                                   (commented mirror)
//! #     }
//! ```
//!
//! A block owns its leading annotation line, so removing the block removes
//! the annotation with it. Brace counting is line-based: a block ends on
//! the line where its brace depth returns to zero. An unterminated block
//! is demoted to opaque text instead of being guessed at.

use std::sync::LazyLock;

use regex::Regex;

static UPSTREAM_HEAD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*upstream\s+(\S+)\s*\{").expect("static regex"));
static LOCATION_HEAD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*location\s+(\S+)\s*\{").expect("static regex"));
static DISABLED_LOCATION_HEAD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*#\s*location\s+(\S+)\s*\{").expect("static regex"));
static UPSTREAM_ANNOTATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*#\s*Upstream for\s+(\S+)\s*$").expect("static regex"));
static ANNOTATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*#\s?(.*)$").expect("static regex"));
static DISABLED_ANNOTATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*#\s*#\s?(.*)$").expect("static regex"));
static SERVER_DIRECTIVE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*server\s+([^;]+);").expect("static regex"));
static PROXY_PASS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*proxy_pass\s+[a-z]+://([^/;\s]+)\s*;").expect("static regex"));

/// One structural unit of the configuration document.
#[derive(Debug, Clone)]
pub enum Block {
    /// Verbatim line run the editor does not model.
    Opaque(OpaqueBlock),
    /// `upstream <name> { ... }` with optional origin-URL annotation.
    Upstream(UpstreamBlock),
    /// Live `location <path> { ... }` with optional display annotation.
    Location(LocationBlock),
    /// Commented mirror of a location block in the disabled section.
    DisabledLocation(DisabledBlock),
}

impl Block {
    /// Raw lines of this block, in document order.
    pub fn lines(&self) -> &[String] {
        match self {
            Block::Opaque(b) => &b.lines,
            Block::Upstream(b) => &b.lines,
            Block::Location(b) => &b.lines,
            Block::DisabledLocation(b) => &b.lines,
        }
    }
}

/// Unmodelled text run.
#[derive(Debug, Clone)]
pub struct OpaqueBlock {
    pub lines: Vec<String>,
}

/// A named backend pool.
#[derive(Debug, Clone)]
pub struct UpstreamBlock {
    /// Pool name as declared in the `upstream` directive.
    pub name: String,
    /// First `server host:port;` address, if one was found.
    pub server_addr: Option<String>,
    /// Verbatim URL from the `# Upstream for <url>` annotation.
    pub origin_url: Option<String>,
    pub lines: Vec<String>,
}

/// An enabled routing rule.
#[derive(Debug, Clone)]
pub struct LocationBlock {
    /// Declared path, exactly as written in the header.
    pub path: String,
    /// Text of the leading comment line, if one was attached.
    pub annotation: Option<String>,
    /// Upstream pool name referenced by `proxy_pass`, if any.
    pub upstream_ref: Option<String>,
    pub lines: Vec<String>,
}

/// A commented-out location block in the disabled/template section.
#[derive(Debug, Clone)]
pub struct DisabledBlock {
    pub path: String,
    pub lines: Vec<String>,
}

/// Parsed configuration document.
///
/// Invariant: `render()` of a freshly parsed document equals the input.
#[derive(Debug, Clone)]
pub struct Document {
    blocks: Vec<Block>,
}

impl Document {
    /// Parses configuration text into a block sequence.
    ///
    /// Never fails: anything that does not match a recognised shape is
    /// preserved as opaque text.
    pub fn parse(text: &str) -> Self {
        let lines: Vec<&str> = text.split('\n').collect();
        let mut blocks: Vec<Block> = Vec::new();
        let mut opaque: Vec<String> = Vec::new();
        let mut i = 0;

        while i < lines.len() {
            let line = lines[i];

            if let Some(caps) = DISABLED_LOCATION_HEAD.captures(line) {
                let path = caps[1].to_owned();
                let mut node_lines = Vec::new();
                // 주석 처리된 블록의 주석(#  # 이름) 라인을 블록에 포함
                if let Some(prev) = opaque.last() {
                    if DISABLED_ANNOTATION
                        .captures(prev)
                        .is_some_and(|c| !c[1].trim().is_empty())
                    {
                        node_lines.push(opaque.pop().expect("checked non-empty"));
                    }
                }
                match consume_block(&lines, i, strip_comment_prefix) {
                    Some((body, next)) => {
                        flush_opaque(&mut blocks, &mut opaque);
                        node_lines.extend(body);
                        blocks.push(Block::DisabledLocation(DisabledBlock {
                            path,
                            lines: node_lines,
                        }));
                        i = next;
                        continue;
                    }
                    None => {
                        // 닫히지 않은 블록: 구조를 추측하지 않고 원문 그대로 둠
                        opaque.extend(node_lines);
                    }
                }
            } else if let Some(caps) = UPSTREAM_HEAD.captures(line) {
                let name = caps[1].to_owned();
                let mut node_lines = Vec::new();
                let mut origin_url = None;
                if let Some(prev) = opaque.last() {
                    if let Some(ann) = UPSTREAM_ANNOTATION.captures(prev) {
                        origin_url = Some(ann[1].to_owned());
                        node_lines.push(opaque.pop().expect("checked non-empty"));
                    }
                }
                match consume_block(&lines, i, |l| l) {
                    Some((body, next)) => {
                        flush_opaque(&mut blocks, &mut opaque);
                        let server_addr = body.iter().find_map(|l| {
                            SERVER_DIRECTIVE.captures(l).and_then(|c| {
                                c[1].split_whitespace().next().map(str::to_owned)
                            })
                        });
                        node_lines.extend(body);
                        blocks.push(Block::Upstream(UpstreamBlock {
                            name,
                            server_addr,
                            origin_url,
                            lines: node_lines,
                        }));
                        i = next;
                        continue;
                    }
                    None => {
                        opaque.extend(node_lines);
                    }
                }
            } else if let Some(caps) = LOCATION_HEAD.captures(line) {
                let path = caps[1].to_owned();
                let mut node_lines = Vec::new();
                let mut annotation = None;
                if let Some(prev) = opaque.last() {
                    if let Some(ann) = ANNOTATION.captures(prev) {
                        let text = ann[1].trim().to_owned();
                        if !text.is_empty() {
                            annotation = Some(text);
                            node_lines.push(opaque.pop().expect("checked non-empty"));
                        }
                    }
                }
                match consume_block(&lines, i, |l| l) {
                    Some((body, next)) => {
                        flush_opaque(&mut blocks, &mut opaque);
                        let upstream_ref = body.iter().find_map(|l| {
                            PROXY_PASS.captures(l).map(|c| c[1].to_owned())
                        });
                        node_lines.extend(body);
                        blocks.push(Block::Location(LocationBlock {
                            path,
                            annotation,
                            upstream_ref,
                            lines: node_lines,
                        }));
                        i = next;
                        continue;
                    }
                    None => {
                        opaque.extend(node_lines);
                    }
                }
            }

            opaque.push(line.to_owned());
            i += 1;
        }

        flush_opaque(&mut blocks, &mut opaque);
        Document { blocks }
    }

    /// Renders the block sequence back to configuration text.
    pub fn render(&self) -> String {
        let mut out: Vec<&str> = Vec::new();
        for block in &self.blocks {
            for line in block.lines() {
                out.push(line);
            }
        }
        out.join("\n")
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// Live location blocks in document order.
    pub fn locations(&self) -> impl Iterator<Item = &LocationBlock> {
        self.blocks.iter().filter_map(|b| match b {
            Block::Location(l) => Some(l),
            _ => None,
        })
    }

    /// Index of the first live location with exactly this header path.
    pub fn find_location(&self, path: &str) -> Option<usize> {
        self.blocks.iter().position(|b| match b {
            Block::Location(l) => l.path == path,
            _ => false,
        })
    }

    /// Index of the first disabled mirror with exactly this header path.
    pub fn find_disabled(&self, path: &str) -> Option<usize> {
        self.blocks.iter().position(|b| match b {
            Block::DisabledLocation(d) => d.path == path,
            _ => false,
        })
    }

    /// Upstream block with this pool name, if present.
    pub fn find_upstream(&self, name: &str) -> Option<&UpstreamBlock> {
        self.blocks.iter().find_map(|b| match b {
            Block::Upstream(u) if u.name == name => Some(u),
            _ => None,
        })
    }

    /// Index of the last upstream block.
    pub fn last_upstream_index(&self) -> Option<usize> {
        self.blocks.iter().rposition(|b| matches!(b, Block::Upstream(_)))
    }

    /// Inserts a block immediately after `index`.
    pub fn insert_after(&mut self, index: usize, block: Block) {
        self.blocks.insert(index + 1, block);
    }

    /// Inserts a block immediately before the opaque line whose trimmed
    /// content equals `marker`. Returns false when no such line exists.
    pub fn insert_before_marker(&mut self, marker: &str, block: Block) -> bool {
        let marker = marker.trim();
        for bi in 0..self.blocks.len() {
            let split_at = match &self.blocks[bi] {
                Block::Opaque(o) => o.lines.iter().position(|l| l.trim() == marker),
                _ => None,
            };
            if let Some(li) = split_at {
                if li == 0 {
                    self.blocks.insert(bi, block);
                } else if let Block::Opaque(o) = &mut self.blocks[bi] {
                    let tail = o.lines.split_off(li);
                    self.blocks
                        .insert(bi + 1, Block::Opaque(OpaqueBlock { lines: tail }));
                    self.blocks.insert(bi + 1, block);
                }
                return true;
            }
        }
        false
    }

    /// Removes every live and disabled block whose header path equals
    /// `path`, together with the single separator line the generator put
    /// in front of it. Returns the number of blocks removed.
    pub fn remove_path(&mut self, path: &str) -> usize {
        let mut removed = 0;
        let mut i = 0;
        while i < self.blocks.len() {
            let is_match = match &self.blocks[i] {
                Block::Location(l) => l.path == path,
                Block::DisabledLocation(d) => d.path == path,
                _ => false,
            };
            if !is_match {
                i += 1;
                continue;
            }
            self.blocks.remove(i);
            removed += 1;
            if i > 0 {
                if let Block::Opaque(o) = &mut self.blocks[i - 1] {
                    let is_separator = o.lines.last().is_some_and(|l| {
                        let t = l.trim();
                        t.is_empty() || t == "#"
                    });
                    if is_separator {
                        o.lines.pop();
                        if o.lines.is_empty() {
                            self.blocks.remove(i - 1);
                            i -= 1;
                        }
                    }
                }
            }
        }
        removed
    }
}

fn flush_opaque(blocks: &mut Vec<Block>, opaque: &mut Vec<String>) {
    if !opaque.is_empty() {
        blocks.push(Block::Opaque(OpaqueBlock {
            lines: std::mem::take(opaque),
        }));
    }
}

/// Consumes a brace-delimited block starting at `start`.
///
/// `effective` maps each raw line to the text used for brace counting
/// (identity for live blocks, comment-prefix stripping for mirrors).
/// Returns the consumed lines and the index after the block, or `None`
/// when the block never closes.
fn consume_block<'a>(
    lines: &[&'a str],
    start: usize,
    effective: fn(&'a str) -> &'a str,
) -> Option<(Vec<String>, usize)> {
    let mut depth: i32 = 0;
    let mut consumed = Vec::new();
    for (offset, raw) in lines[start..].iter().enumerate() {
        depth += brace_delta(effective(raw));
        consumed.push((*raw).to_owned());
        if depth <= 0 {
            // 첫 줄에서 여는 중괄호를 못 보면 블록이 아님
            if offset == 0 && depth == 0 {
                return None;
            }
            return Some((consumed, start + offset + 1));
        }
    }
    None
}

fn brace_delta(line: &str) -> i32 {
    let mut delta = 0;
    for c in line.chars() {
        match c {
            '{' => delta += 1,
            '}' => delta -= 1,
            _ => {}
        }
    }
    delta
}

/// Strips the leading `#` (and indentation before it) for brace counting
/// in commented mirror blocks.
fn strip_comment_prefix(line: &str) -> &str {
    let trimmed = line.trim_start();
    trimmed.strip_prefix('#').unwrap_or(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SNIPPET: &str = "\
http {
    # Upstream for https://api.openai.com
    upstream api_openai_com_upstream {
        server api.openai.com:443;
        keepalive 32;
    }

    # HTTP server
    server {
        listen 80;

        # OpenAI API proxy
        location /openai/ {
            rewrite ^/openai/(.*) /$1 break;
            proxy_pass https://api_openai_com_upstream;
        }

        # Health check endpoint
        location /health {
            return 200 \"OK\";
        }
    }
}
";

    #[test]
    fn parse_render_round_trip_is_lossless() {
        let doc = Document::parse(SNIPPET);
        assert_eq!(doc.render(), SNIPPET);
    }

    #[test]
    fn parse_finds_upstream_with_annotation() {
        let doc = Document::parse(SNIPPET);
        let up = doc.find_upstream("api_openai_com_upstream").expect("upstream");
        assert_eq!(up.origin_url.as_deref(), Some("https://api.openai.com"));
        assert_eq!(up.server_addr.as_deref(), Some("api.openai.com:443"));
        // 주석 라인이 블록에 포함됨
        assert!(up.lines[0].contains("Upstream for"));
    }

    #[test]
    fn parse_finds_locations_with_annotations() {
        let doc = Document::parse(SNIPPET);
        let locations: Vec<_> = doc.locations().collect();
        assert_eq!(locations.len(), 2);
        assert_eq!(locations[0].path, "/openai/");
        assert_eq!(locations[0].annotation.as_deref(), Some("OpenAI API proxy"));
        assert_eq!(
            locations[0].upstream_ref.as_deref(),
            Some("api_openai_com_upstream")
        );
        assert_eq!(locations[1].path, "/health");
        assert_eq!(
            locations[1].annotation.as_deref(),
            Some("Health check endpoint")
        );
        assert_eq!(locations[1].upstream_ref, None);
    }

    #[test]
    fn exact_path_match_does_not_match_longer_path() {
        let text = "\
location /gpt2/ {
    proxy_pass http://a_upstream;
}
";
        let doc = Document::parse(text);
        assert!(doc.find_location("/gpt/").is_none());
        assert!(doc.find_location("/gpt2/").is_some());
    }

    #[test]
    fn disabled_location_is_recognised() {
        let text = "\
    # server {
    #     listen 443 ssl;
    #     # OpenAI API proxy (same as HTTP)
    #     location /openai/ {
    #         proxy_pass https://api_openai_com_upstream;
    #     }
    # }
";
        let doc = Document::parse(text);
        let idx = doc.find_disabled("/openai/").expect("disabled block");
        match &doc.blocks()[idx] {
            Block::DisabledLocation(d) => {
                assert_eq!(d.path, "/openai/");
                // 주석 라인 포함, server 라인은 제외
                assert!(d.lines[0].contains("(same as HTTP)"));
                assert!(d.lines.iter().all(|l| !l.contains("listen")));
            }
            other => panic!("expected disabled block, got {other:?}"),
        }
        assert_eq!(doc.render(), text);
    }

    #[test]
    fn unterminated_block_stays_opaque() {
        let text = "\
upstream broken_upstream {
    server example.com:80;
";
        let doc = Document::parse(text);
        assert!(doc.find_upstream("broken_upstream").is_none());
        assert_eq!(doc.render(), text);
    }

    #[test]
    fn nested_braces_are_balanced() {
        let text = "\
location /app/ {
    if ($request_method = POST) {
        return 405;
    }
    proxy_pass http://pool_upstream;
}
trailing;
";
        let doc = Document::parse(text);
        let idx = doc.find_location("/app/").expect("location");
        match &doc.blocks()[idx] {
            Block::Location(l) => assert_eq!(l.lines.len(), 6),
            other => panic!("expected location, got {other:?}"),
        }
        assert_eq!(doc.render(), text);
    }

    #[test]
    fn insert_before_marker_splits_opaque_run() {
        let text = "\
first;

# HTTP server
server {
}
";
        let mut doc = Document::parse(text);
        let inserted = doc.insert_before_marker(
            "# HTTP server",
            Block::Opaque(OpaqueBlock {
                lines: vec!["inserted;".to_owned()],
            }),
        );
        assert!(inserted);
        let rendered = doc.render();
        let marker_pos = rendered.find("# HTTP server").expect("marker");
        let inserted_pos = rendered.find("inserted;").expect("inserted line");
        assert!(inserted_pos < marker_pos);
        assert!(rendered.starts_with("first;"));
    }

    #[test]
    fn insert_before_missing_marker_returns_false() {
        let mut doc = Document::parse("plain text\n");
        let inserted = doc.insert_before_marker(
            "# no such marker",
            Block::Opaque(OpaqueBlock { lines: vec![] }),
        );
        assert!(!inserted);
        assert_eq!(doc.render(), "plain text\n");
    }

    #[test]
    fn remove_path_strips_generated_separator() {
        let text = "\
location /a/ {
    proxy_pass http://a_upstream;
}

# Claude
location /claude/ {
    proxy_pass https://c_upstream;
}
";
        let mut doc = Document::parse(text);
        let removed = doc.remove_path("/claude/");
        assert_eq!(removed, 1);
        assert_eq!(
            doc.render(),
            "\
location /a/ {
    proxy_pass http://a_upstream;
}
"
        );
    }

    #[test]
    fn remove_missing_path_is_byte_identical_noop() {
        let doc_text = SNIPPET;
        let mut doc = Document::parse(doc_text);
        let removed = doc.remove_path("/claude/");
        assert_eq!(removed, 0);
        assert_eq!(doc.render(), doc_text);
    }

    #[test]
    fn remove_path_drops_disabled_mirror_too() {
        let text = "\
location /claude/ {
    proxy_pass https://c_upstream;
}
    #
    #         # Claude
    #         location /claude/ {
    #             proxy_pass https://c_upstream;
    #         }
tail;
";
        let mut doc = Document::parse(text);
        let removed = doc.remove_path("/claude/");
        assert_eq!(removed, 2);
        let rendered = doc.render();
        assert!(!rendered.contains("location /claude/"));
        assert!(rendered.contains("tail;"));
    }
}
