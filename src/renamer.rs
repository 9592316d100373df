// src/renamer.rs

//! Renamer: minimal source edits between standalone and embedded form
//!
//! The syntax tree only locates what has to change. The change itself is a
//! handful of text splices on the original source, so comments, blank lines
//! and formatting outside the edited tokens come through byte for byte.
//! Exactly three things are edited:
//!
//! - the crate-level `#![crate_name = "..."]` attribute (the module declaration)
//! - the name of the top-level entry function
//! - the `pub` in front of it
//!
//! For a standalone source without an explicit `crate_name`:
//!
//! ```text
//! unembed(embed(text, "sample"), "main") == text
//! ```

use crate::config::{DEFAULT_MODULE, EntryNames};
use crate::error::{Error, Result};
use proc_macro2::{LineColumn, Span};
use std::path::Path;
use syn::spanned::Spanned;
use syn::{AttrStyle, Attribute, Item, ItemFn, Visibility};

const BOM: &str = "\u{feff}";

/// A source file to rewrite: its text and the tree parsed from that text
#[derive(Debug, Clone, Copy)]
pub struct SourceFile<'a> {
    pub path: &'a Path,
    pub text: &'a str,
    pub tree: &'a syn::File,
}

/// Replace the bytes `start..end` with `text`
#[derive(Debug, Clone, PartialEq, Eq)]
struct TextEdit {
    start: usize,
    end: usize,
    text: String,
}

impl TextEdit {
    fn insert(at: usize, text: impl Into<String>) -> Self {
        Self {
            start: at,
            end: at,
            text: text.into(),
        }
    }
}

/// Rename module and entry into embedded form
///
/// A standalone entry that already carries a visibility is refused: `embed`
/// adds `pub` and `unembed` strips it again, so anything else would not come
/// back unchanged.
pub fn embed(file: SourceFile<'_>, module: &str, names: &EntryNames) -> Result<String> {
    let index = LineIndex::new(file);
    let mut edits = vec![set_module_name(&index, module)?];

    if let Some(entry) = find_entry(file.tree, &names.standalone) {
        if !matches!(entry.vis, Visibility::Inherited) {
            return Err(Error::InvalidUnit {
                dir: file.path.parent().unwrap_or(file.path).to_path_buf(),
                reason: format!(
                    "`fn {}` in {} must not have a visibility",
                    names.standalone,
                    file.path.display()
                ),
            });
        }
        let signature = index.offset(entry.sig.span().start())?;
        edits.push(TextEdit::insert(signature, "pub "));
        edits.push(index.replace(entry.sig.ident.span(), &names.embedded)?);
    }

    apply_edits(&index, edits)
}

/// Exact inverse of [`embed`]
pub fn unembed(file: SourceFile<'_>, original_module: &str, names: &EntryNames) -> Result<String> {
    let index = LineIndex::new(file);
    let mut edits = Vec::new();

    if original_module != DEFAULT_MODULE {
        edits.push(set_module_name(&index, original_module)?);
    } else if let Some(attr) = crate_name_attr(file.tree) {
        edits.push(remove_attribute_line(&index, attr)?);
    }

    if let Some(entry) = find_entry(file.tree, &names.embedded) {
        if !matches!(entry.vis, Visibility::Inherited) {
            let vis = index.offset(entry.vis.span().start())?;
            let signature = index.offset(entry.sig.span().start())?;
            edits.push(TextEdit {
                start: vis,
                end: signature,
                text: String::new(),
            });
        }
        edits.push(index.replace(entry.sig.ident.span(), &names.standalone)?);
    }

    apply_edits(&index, edits)
}

fn is_crate_name(attr: &Attribute) -> bool {
    matches!(attr.style, AttrStyle::Inner(_)) && attr.path().is_ident("crate_name")
}

fn crate_name_attr(tree: &syn::File) -> Option<&Attribute> {
    tree.attrs.iter().find(|attr| is_crate_name(attr))
}

fn find_entry<'t>(tree: &'t syn::File, name: &str) -> Option<&'t ItemFn> {
    tree.items.iter().find_map(|item| match item {
        Item::Fn(func) if func.sig.ident == name => Some(func),
        _ => None,
    })
}

/// Rewrite the `crate_name` attribute in place, or add one on its own line
/// after the last inner attribute (top of the file when there is none)
fn set_module_name(index: &LineIndex<'_>, module: &str) -> Result<TextEdit> {
    let attr_text = format!("#![crate_name = \"{}\"]", module);
    let tree = index.file.tree;
    let text = index.file.text;

    if let Some(existing) = crate_name_attr(tree) {
        let (start, end) = index.attribute_range(existing)?;
        return Ok(TextEdit {
            start,
            end,
            text: attr_text,
        });
    }

    if let Some(last) = tree.attrs.last() {
        let (_, end) = index.attribute_range(last)?;
        let line_end = text[end..].find('\n').map_or(text.len(), |i| end + i);
        return Ok(TextEdit::insert(line_end, format!("\n{}", attr_text)));
    }

    let top = match &tree.shebang {
        Some(_) => text.find('\n').map_or(text.len(), |i| i + 1),
        None => index.body_start(),
    };
    if top == text.len() && top > 0 && !text.ends_with('\n') {
        return Ok(TextEdit::insert(top, format!("\n{}", attr_text)));
    }
    Ok(TextEdit::insert(top, format!("{}\n", attr_text)))
}

/// Delete an attribute together with the line break that [`set_module_name`]
/// added for it
fn remove_attribute_line(index: &LineIndex<'_>, attr: &Attribute) -> Result<TextEdit> {
    let text = index.file.text;
    let (mut start, mut end) = index.attribute_range(attr)?;
    let line_start = start == index.body_start() || text[..start].ends_with('\n');

    if line_start && text[end..].starts_with('\n') {
        end += 1;
    } else if line_start && end == text.len() && start > 0 && text[..start].ends_with('\n') {
        start -= 1;
    }
    Ok(TextEdit {
        start,
        end,
        text: String::new(),
    })
}

fn apply_edits(index: &LineIndex<'_>, mut edits: Vec<TextEdit>) -> Result<String> {
    edits.sort_by(|a, b| b.start.cmp(&a.start));
    let mut output = index.file.text.to_string();
    let mut limit = output.len();

    for edit in edits {
        if edit.start > edit.end || edit.end > limit {
            return Err(index.error(format!(
                "overlapping edit at bytes {}..{}",
                edit.start, edit.end
            )));
        }
        output.replace_range(edit.start..edit.end, &edit.text);
        limit = edit.start;
    }
    Ok(output)
}

/// Maps span line/column positions back to byte offsets of the source text
struct LineIndex<'a> {
    file: SourceFile<'a>,
    line_starts: Vec<usize>,
}

impl<'a> LineIndex<'a> {
    fn new(file: SourceFile<'a>) -> Self {
        // The parser never sees a byte order mark, so line 1 starts after it
        let first = if file.text.starts_with(BOM) { BOM.len() } else { 0 };
        let mut line_starts = vec![first];
        line_starts.extend(
            file.text
                .char_indices()
                .filter(|&(_, c)| c == '\n')
                .map(|(i, _)| i + 1),
        );
        Self { file, line_starts }
    }

    fn body_start(&self) -> usize {
        self.line_starts[0]
    }

    /// Byte offset of a position (1-based line, 0-based column in chars)
    fn offset(&self, at: LineColumn) -> Result<usize> {
        let start = at
            .line
            .checked_sub(1)
            .and_then(|line| self.line_starts.get(line))
            .copied()
            .ok_or_else(|| self.error(format!("line {} out of range", at.line)))?;
        let rest = &self.file.text[start..];
        rest.char_indices()
            .map(|(i, _)| i)
            .chain(std::iter::once(rest.len()))
            .nth(at.column)
            .map(|i| start + i)
            .ok_or_else(|| self.error(format!("column {} out of range", at.column)))
    }

    fn range(&self, span: Span) -> Result<(usize, usize)> {
        Ok((self.offset(span.start())?, self.offset(span.end())?))
    }

    /// From `#` to the closing `]`; the whole comment for doc comments
    fn attribute_range(&self, attr: &Attribute) -> Result<(usize, usize)> {
        let start = self.offset(attr.pound_token.span.start())?;
        let end = self.offset(attr.bracket_token.span.close().end())?;
        Ok((start, end))
    }

    fn replace(&self, span: Span, text: &str) -> Result<TextEdit> {
        let (start, end) = self.range(span)?;
        Ok(TextEdit {
            start,
            end,
            text: text.to_string(),
        })
    }

    fn error(&self, message: String) -> Error {
        Error::Rewrite {
            path: self.file.path.to_path_buf(),
            message,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{EntryForm, entry_forms, module_name};

    const SAMPLE: &str = r#"//! Sample code
// Sample code
use std::env;

/// sample shows the calling args
fn main() {
    // print them
    println!("Sample does some stuff, here args are {:?}", env::args().collect::<Vec<_>>());
}

fn helper() -> u32 {
    42
}
"#;

    const EMBEDDED_SAMPLE: &str = r#"//! Sample code
#![crate_name = "sample"]
// Sample code
use std::env;

/// sample shows the calling args
pub fn app_main() {
    // print them
    println!("Sample does some stuff, here args are {:?}", env::args().collect::<Vec<_>>());
}

fn helper() -> u32 {
    42
}
"#;

    fn names() -> EntryNames {
        EntryNames::default()
    }

    fn embed_text(text: &str, module: &str) -> Result<String> {
        let tree = syn::parse_file(text).unwrap();
        let file = SourceFile {
            path: Path::new("apps/sample/main.rs"),
            text,
            tree: &tree,
        };
        embed(file, module, &names())
    }

    fn unembed_text(text: &str, module: &str) -> Result<String> {
        let tree = syn::parse_file(text).unwrap();
        let file = SourceFile {
            path: Path::new("apps/sample/main.rs"),
            text,
            tree: &tree,
        };
        unembed(file, module, &names())
    }

    #[test]
    fn test_embed_edits_only_module_and_entry() {
        let embedded = embed_text(SAMPLE, "sample").unwrap();
        assert_eq!(embedded, EMBEDDED_SAMPLE);

        let tree = syn::parse_file(&embedded).unwrap();
        assert_eq!(module_name(&tree).as_deref(), Some("sample"));
        assert_eq!(entry_forms(&tree, &names()), vec![EntryForm::Embedded]);
    }

    #[test]
    fn test_round_trip_is_byte_identical() {
        let embedded = embed_text(SAMPLE, "sample").unwrap();
        assert_eq!(unembed_text(&embedded, DEFAULT_MODULE).unwrap(), SAMPLE);
    }

    #[test]
    fn test_round_trip_without_inner_attributes() {
        let original = r#"// tool
use std::process::ExitCode;

fn main() -> ExitCode {
    ExitCode::SUCCESS
}
"#;
        let embedded = embed_text(original, "tool").unwrap();
        assert!(embedded.starts_with("#![crate_name = \"tool\"]\n// tool\n"));
        assert!(embedded.contains("pub fn app_main() -> ExitCode {"));
        assert_eq!(unembed_text(&embedded, DEFAULT_MODULE).unwrap(), original);
    }

    #[test]
    fn test_round_trip_after_trailing_comment_on_attribute_line() {
        let original = "#![allow(dead_code)] // lints\nfn main() {}\n";
        let embedded = embed_text(original, "tool").unwrap();
        assert_eq!(
            embedded,
            "#![allow(dead_code)] // lints\n#![crate_name = \"tool\"]\npub fn app_main() {}\n"
        );
        assert_eq!(unembed_text(&embedded, DEFAULT_MODULE).unwrap(), original);
    }

    #[test]
    fn test_non_ascii_columns_map_to_bytes() {
        let original = "//! Grüße\n/* ü */ fn main() { println!(\"ä\"); }\n";
        let embedded = embed_text(original, "gruss").unwrap();
        assert_eq!(
            embedded,
            concat!(
                "//! Grüße\n#![crate_name = \"gruss\"]\n",
                "/* ü */ pub fn app_main() { println!(\"ä\"); }\n",
            )
        );
        assert_eq!(unembed_text(&embedded, DEFAULT_MODULE).unwrap(), original);
    }

    #[test]
    fn test_embed_refuses_visible_main() {
        let err = embed_text("pub fn main() {}\n", "sample").unwrap_err();
        match err {
            Error::InvalidUnit { dir, reason } => {
                assert_eq!(dir, Path::new("apps/sample"));
                assert!(reason.contains("must not have a visibility"));
            }
            other => panic!("expected invalid unit, got {other:?}"),
        }
        assert!(embed_text("pub(crate) fn main() {}\n", "sample").is_err());
    }

    #[test]
    fn test_embed_of_embedded_source_is_stable() {
        assert_eq!(embed_text(EMBEDDED_SAMPLE, "sample").unwrap(), EMBEDDED_SAMPLE);
    }

    #[test]
    fn test_embed_rewrites_existing_crate_name() {
        let embedded = embed_text("#![crate_name = \"old\"]\nfn main() {}\n", "fresh").unwrap();
        assert_eq!(embedded, "#![crate_name = \"fresh\"]\npub fn app_main() {}\n");
    }

    #[test]
    fn test_unembed_to_named_module() {
        let restored = unembed_text(EMBEDDED_SAMPLE, "tool").unwrap();
        assert!(restored.contains("#![crate_name = \"tool\"]"));
        assert!(restored.contains("\nfn main() {"));
        assert!(!restored.contains("pub fn main"));
    }

    #[test]
    fn test_entry_signature_is_preserved() {
        let original =
            "async fn main() -> Result<(), Box<dyn std::error::Error>> {\n    Ok(())\n}\n";
        let embedded = embed_text(original, "tool").unwrap();
        assert!(
            embedded.contains("pub async fn app_main() -> Result<(), Box<dyn std::error::Error>>")
        );
        assert_eq!(unembed_text(&embedded, DEFAULT_MODULE).unwrap(), original);
    }
}
