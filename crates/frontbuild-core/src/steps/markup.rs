//! Entry page rewriting.
//!
//! The source page boots through an in-browser AMD loader:
//!
//! ```html
//! <script id="app-js" data-main="js/app" src="js/lib/require.js"></script>
//! ```
//!
//! After bundling, the entry tag must load the bundle directly and the
//! loader attribute goes away. The document is tokenized just far enough to
//! find start tags; only the entry tag is re-serialized and every other byte
//! is written back untouched.

use regex::Regex;
use std::fs;
use std::ops::Range;
use std::path::Path;
use std::sync::OnceLock;
use tracing::debug;

use crate::config::MarkupConfig;
use crate::error::{BuildError, Result};

/// Elements whose content is raw text and must not be scanned for tags.
const RAW_TEXT_ELEMENTS: [&str; 2] = ["script", "style"];

fn tag_name_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^<([A-Za-z][A-Za-z0-9:-]*)").expect("valid tag name regex"))
}

fn attribute_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"([^\s"'>/=]+)(?:\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'=<>`]+)))?"#)
            .expect("valid attribute regex")
    })
}

/// An attribute of a start tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    pub value: Option<String>,
    /// Byte range of the raw attribute text in the document.
    pub span: Range<usize>,
}

/// A start tag found in the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartTag {
    pub name: String,
    pub attributes: Vec<Attribute>,
    /// Byte range from `<` to `>` inclusive.
    pub span: Range<usize>,
    /// Tag ends in `/>`. Ignored for `script` and `style`.
    pub self_closing: bool,
}

impl StartTag {
    /// Value of attribute `name` (ASCII case-insensitive).
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.name.eq_ignore_ascii_case(name))
            .and_then(|a| a.value.as_deref())
    }
}

/// Collect every start tag in `html`, in document order.
///
/// Returns a description of the first malformed construct on failure.
pub fn scan_start_tags(html: &str) -> std::result::Result<Vec<StartTag>, String> {
    let bytes = html.as_bytes();
    let mut tags = Vec::new();
    let mut i = 0;

    while let Some(offset) = html[i..].find('<') {
        let lt = i + offset;
        let rest = &html[lt..];

        if rest.starts_with("<!--") {
            let close = rest[4..]
                .find("-->")
                .ok_or_else(|| format!("unterminated comment at byte {}", lt))?;
            i = lt + 4 + close + 3;
        } else if rest.starts_with("</") || rest.starts_with("<!") || rest.starts_with("<?") {
            let close = rest
                .find('>')
                .ok_or_else(|| format!("unterminated tag at byte {}", lt))?;
            i = lt + close + 1;
        } else if bytes.get(lt + 1).map_or(false, u8::is_ascii_alphabetic) {
            let tag = parse_start_tag(html, lt)?;
            i = tag.span.end;
            let lower = tag.name.to_ascii_lowercase();
            // A trailing slash does not close raw-text elements.
            if RAW_TEXT_ELEMENTS.contains(&lower.as_str()) {
                i = skip_raw_text(html, i, &lower)
                    .ok_or_else(|| format!("unterminated <{}> element at byte {}", lower, lt))?;
            }
            tags.push(tag);
        } else {
            // A bare '<' in text.
            i = lt + 1;
        }
    }

    Ok(tags)
}

fn parse_start_tag(html: &str, lt: usize) -> std::result::Result<StartTag, String> {
    let bytes = html.as_bytes();
    let name = tag_name_re()
        .captures(&html[lt..])
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
        .ok_or_else(|| format!("invalid tag name at byte {}", lt))?;

    let attrs_start = lt + 1 + name.len();
    let mut quote: Option<u8> = None;
    let mut k = attrs_start;
    loop {
        let Some(&b) = bytes.get(k) else {
            return Err(match quote {
                Some(_) => format!("unterminated attribute value in <{}> at byte {}", name, lt),
                None => format!("unterminated <{}> tag at byte {}", name, lt),
            });
        };
        match quote {
            Some(q) if b == q => quote = None,
            Some(_) => {}
            None => match b {
                b'"' | b'\'' => quote = Some(b),
                b'>' => break,
                _ => {}
            },
        }
        k += 1;
    }

    let inner = &html[attrs_start..k];
    let attributes = attribute_re()
        .captures_iter(inner)
        .filter_map(|c| {
            let whole = c.get(0)?;
            let name = c.get(1)?.as_str().to_string();
            let value = c
                .get(2)
                .or_else(|| c.get(3))
                .or_else(|| c.get(4))
                .map(|m| m.as_str().to_string());
            Some(Attribute {
                name,
                value,
                span: attrs_start + whole.start()..attrs_start + whole.end(),
            })
        })
        .collect();

    Ok(StartTag {
        name,
        attributes,
        span: lt..k + 1,
        self_closing: inner.trim_end().ends_with('/'),
    })
}

/// Index of the closing `</name` after raw-text content starting at `from`.
fn skip_raw_text(html: &str, from: usize, name: &str) -> Option<usize> {
    let needle = format!("</{}", name);
    html[from..]
        .to_ascii_lowercase()
        .find(&needle)
        .map(|pos| from + pos)
}

/// Rewrite the entry script tag of `html`.
///
/// `source` is only used for error context.
pub fn rewrite_markup(html: &str, source: &Path, config: &MarkupConfig) -> Result<String> {
    let tags = scan_start_tags(html).map_err(|reason| BuildError::Parse {
        path: source.to_path_buf(),
        reason,
    })?;

    let entries: Vec<&StartTag> = tags
        .iter()
        .filter(|t| t.name.eq_ignore_ascii_case("script"))
        .filter(|t| t.attr("id") == Some(config.entry_id.as_str()))
        .collect();

    let tag = match entries.as_slice() {
        [] => {
            return Err(BuildError::NotFound {
                element: format!("script#{}", config.entry_id),
                path: source.to_path_buf(),
            })
        }
        [tag] => *tag,
        _ => {
            return Err(BuildError::Parse {
                path: source.to_path_buf(),
                reason: format!(
                    "{} script elements share id \"{}\"",
                    entries.len(),
                    config.entry_id
                ),
            })
        }
    };

    let mut out = String::with_capacity(html.len() + config.bundled_script.len());
    out.push_str(&html[..tag.span.start]);
    out.push_str(&render_entry_tag(html, tag, config));
    out.push_str(&html[tag.span.end..]);
    Ok(out)
}

fn render_entry_tag(html: &str, tag: &StartTag, config: &MarkupConfig) -> String {
    let src = format!(" src=\"{}\"", config.bundled_script.replace('"', "&quot;"));

    let mut rendered = format!("<{}", tag.name);
    let mut has_src = false;
    for attr in &tag.attributes {
        if attr.name.eq_ignore_ascii_case(&config.loader_attribute) {
            continue;
        }
        if attr.name.eq_ignore_ascii_case("src") {
            rendered.push_str(&src);
            has_src = true;
        } else {
            rendered.push(' ');
            rendered.push_str(&html[attr.span.clone()]);
        }
    }
    if !has_src {
        rendered.push_str(&src);
    }
    rendered.push('>');
    rendered
}

/// Read `source`, rewrite its entry script tag and write the result to
/// `output`. Nothing is written when the rewrite fails.
pub fn rewrite_entry_html(source: &Path, output: &Path, config: &MarkupConfig) -> Result<()> {
    let html = fs::read_to_string(source).map_err(|e| BuildError::fs(source, e))?;
    let rewritten = rewrite_markup(&html, source, config)?;

    if let Some(parent) = output.parent() {
        fs::create_dir_all(parent).map_err(|e| BuildError::fs(parent, e))?;
    }
    fs::write(output, rewritten).map_err(|e| BuildError::fs(output, e))?;
    debug!(output = %output.display(), "entry page rewritten");
    Ok(())
}
