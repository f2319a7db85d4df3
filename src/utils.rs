//! Utility functions for path construction and message splitting.

use std::path::PathBuf;

/// Constructs a file system path by joining a directory path with a file or
/// subdirectory name.
///
/// # Examples
///
/// ```ignore
/// let path = get_path("/var/lib/bracket", "settings.json");
/// assert_eq!(path, "/var/lib/bracket/settings.json");
/// ```
pub fn get_path(dir_path: &str, subdir_path: &str) -> String {
    let path_buf: PathBuf = [dir_path, subdir_path].iter().collect();
    path_buf.to_string_lossy().into_owned()
}

/// Splits `text` in pages of at most `max_len` bytes.
///
/// Pages break on line boundaries. A line longer than `max_len` is split on
/// character boundaries. Empty text gives no page.
pub fn paginate(text: &str, max_len: usize) -> Vec<String> {
    let max_len = max_len.max(1);
    let mut pages = Vec::new();
    let mut current = String::new();

    for line in text.lines() {
        for chunk in split_line(line, max_len) {
            let separator = usize::from(!current.is_empty());
            if current.len() + separator + chunk.len() > max_len {
                pages.push(std::mem::take(&mut current));
            }
            if !current.is_empty() {
                current.push('\n');
            }
            current.push_str(chunk);
        }
    }

    if !current.is_empty() {
        pages.push(current);
    }
    pages
}

fn split_line(line: &str, max_len: usize) -> Vec<&str> {
    let mut chunks = Vec::new();
    let mut rest = line;

    while rest.len() > max_len {
        let mut end = max_len;
        while !rest.is_char_boundary(end) {
            end -= 1;
        }
        if end == 0 {
            // a single character wider than the page
            end = rest.chars().next().map_or(rest.len(), char::len_utf8);
        }
        let (chunk, tail) = rest.split_at(end);
        chunks.push(chunk);
        rest = tail;
    }

    chunks.push(rest);
    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_path_simple() {
        let path = get_path("/home/user", "settings.json");
        #[cfg(unix)]
        assert_eq!(path, "/home/user/settings.json");
        #[cfg(windows)]
        assert_eq!(path, "\\home\\user\\settings.json");
    }

    #[test]
    fn test_get_path_relative_paths() {
        let path = get_path(".", "session");
        #[cfg(unix)]
        assert_eq!(path, "./session");
        #[cfg(windows)]
        assert_eq!(path, ".\\session");
    }

    #[test]
    fn test_get_path_multiple_components() {
        let base = get_path("/home", "user");
        let final_path = get_path(&base, "session");
        #[cfg(unix)]
        assert_eq!(final_path, "/home/user/session");
        #[cfg(windows)]
        assert_eq!(final_path, "\\home\\user\\session");
    }

    #[test]
    fn test_paginate_short_text() {
        assert_eq!(paginate("a\nb", 10), ["a\nb"]);
        assert!(paginate("", 10).is_empty());
    }

    #[test]
    fn test_paginate_on_line_boundaries() {
        let pages = paginate("aaaa\nbbbb\ncccc", 9);
        assert_eq!(pages, ["aaaa\nbbbb", "cccc"]);
    }

    #[test]
    fn test_paginate_long_line() {
        let pages = paginate("abcdefghij", 4);
        assert_eq!(pages, ["abcd", "efgh", "ij"]);
    }

    #[test]
    fn test_paginate_multibyte() {
        let pages = paginate("ééé", 3);
        assert!(pages.iter().all(|p| p.len() <= 3));
        assert_eq!(pages.concat(), "ééé");
    }

    #[test]
    fn test_paginate_respects_limit() {
        let text = (0..500)
            .map(|i| format!("line number {}", i))
            .collect::<Vec<String>>()
            .join("\n");

        let pages = paginate(&text, 1700);
        assert!(pages.len() > 1);
        assert!(pages.iter().all(|p| p.len() <= 1700));
        assert_eq!(pages.join("\n"), text);
    }
}
