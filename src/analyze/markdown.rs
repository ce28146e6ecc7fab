//! Minimal Markdown line model shared by the documentation analyzers.
//!
//! Only fences matter here: headings, links and keywords inside fenced code
//! are not part of the document's prose.

/// One fenced code block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FencedBlock {
    /// Info string after the opening fence, if any (e.g. `rust`)
    pub language: Option<String>,
    /// 1-based line of the opening fence
    pub start_line: usize,
}

/// A document split into prose lines and fenced blocks.
#[derive(Debug, Default)]
pub struct MarkdownDoc<'a> {
    /// Lines outside any fence, with their 1-based line numbers
    pub prose: Vec<(usize, &'a str)>,
    pub blocks: Vec<FencedBlock>,
}

impl<'a> MarkdownDoc<'a> {
    pub fn parse(content: &'a str) -> Self {
        let mut doc = MarkdownDoc::default();
        // (fence char, fence length) while inside a block
        let mut open: Option<(char, usize)> = None;

        for (idx, line) in content.lines().enumerate() {
            let trimmed = line.trim_start();
            match open {
                Some((ch, len)) => {
                    if fence_len(trimmed, ch) >= len && trimmed.trim_start_matches(ch).trim().is_empty() {
                        open = None;
                    }
                }
                None => {
                    if let Some((ch, len)) = opening_fence(trimmed) {
                        let info = trimmed[len..].trim();
                        let language = info
                            .split_whitespace()
                            .next()
                            .map(|s| s.trim_matches('{').trim_matches('}').to_string())
                            .filter(|s| !s.is_empty());
                        doc.blocks.push(FencedBlock {
                            language,
                            start_line: idx + 1,
                        });
                        open = Some((ch, len));
                    } else {
                        doc.prose.push((idx + 1, line));
                    }
                }
            }
        }

        doc
    }

    /// Prose lines joined back into one string.
    pub fn prose_text(&self) -> String {
        let mut out = String::new();
        for (_, line) in &self.prose {
            out.push_str(line);
            out.push('\n');
        }
        out
    }
}

fn fence_len(line: &str, ch: char) -> usize {
    line.chars().take_while(|c| *c == ch).count()
}

fn opening_fence(line: &str) -> Option<(char, usize)> {
    for ch in ['`', '~'] {
        let len = fence_len(line, ch);
        if len >= 3 {
            // backtick info strings may not contain backticks
            if ch == '`' && line[len..].contains('`') {
                return None;
            }
            return Some((ch, len));
        }
    }
    None
}
