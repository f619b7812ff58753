//! Text blocks injected as additional context.

use autoread_core::Entry;
use fs_err as fs;

/// Renders one entry, or `None` if a file entry cannot be read.
pub fn render_entry(entry: &Entry) -> Option<String> {
    match entry {
        Entry::File { path } => match fs::read_to_string(path) {
            Ok(content) => Some(format!(
                "<autoread path=\"{}\">\n{}\n</autoread>",
                escape_attr(&path.to_string_lossy()),
                content.trim_end_matches('\n')
            )),
            Err(e) => {
                tracing::warn!(error = %e, "Skipping unreadable autoread file");
                None
            }
        },
        Entry::Directory { path, children } => {
            let mut block = format!(
                "<autoread-dir path=\"{}\">\n",
                escape_attr(&path.to_string_lossy())
            );
            for child in children {
                block.push_str(child);
                block.push('\n');
            }
            block.push_str("</autoread-dir>");
            Some(block)
        }
    }
}

/// Escapes a value for a double-quoted attribute.
fn escape_attr(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            other => out.push(other),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::TempDir;

    #[test]
    fn test_file_block_wraps_content() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("AGENTS.md");
        std::fs::write(&path, "line one\nline two\n").unwrap();

        let block = render_entry(&Entry::File { path: path.clone() }).unwrap();
        assert_eq!(
            block,
            format!(
                "<autoread path=\"{}\">\nline one\nline two\n</autoread>",
                path.display()
            )
        );
    }

    #[test]
    fn test_missing_file_renders_nothing() {
        let entry = Entry::File {
            path: PathBuf::from("/definitely/not/here/AGENTS.md"),
        };
        assert!(render_entry(&entry).is_none());
    }

    #[test]
    fn test_directory_block_lists_children() {
        let entry = Entry::Directory {
            path: PathBuf::from("/p/docs"),
            children: vec!["a.md".to_string(), "b.md".to_string()],
        };
        assert_eq!(
            render_entry(&entry).unwrap(),
            "<autoread-dir path=\"/p/docs\">\na.md\nb.md\n</autoread-dir>"
        );
    }

    #[test]
    fn test_empty_directory_block() {
        let entry = Entry::Directory {
            path: PathBuf::from("/p/empty"),
            children: vec![],
        };
        assert_eq!(
            render_entry(&entry).unwrap(),
            "<autoread-dir path=\"/p/empty\">\n</autoread-dir>"
        );
    }

    #[test]
    fn test_path_attribute_is_escaped() {
        let entry = Entry::Directory {
            path: PathBuf::from("/p/\"odd\" & <dir>"),
            children: vec![],
        };
        assert_eq!(
            render_entry(&entry).unwrap(),
            "<autoread-dir path=\"/p/&quot;odd&quot; &amp; &lt;dir&gt;\">\n</autoread-dir>"
        );
    }
}
