// src/utils.rs

const LOG_BODY_LIMIT: usize = 512;

/// Get file extension in lowercase
pub fn get_file_extension(filename: &str) -> Option<String> {
    std::path::Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_lowercase())
}

/// Human readable byte count
pub fn format_file_size(bytes: u64) -> String {
    const KB: f64 = 1024.0;
    const MB: f64 = KB * 1024.0;

    let size = bytes as f64;
    if size >= MB {
        format!("{:.1}MB", size / MB)
    } else if size >= KB {
        format!("{:.1}KB", size / KB)
    } else {
        format!("{}B", bytes)
    }
}

/// Cut long response bodies before they reach the log
pub fn truncate_for_log(text: &str) -> String {
    if text.chars().count() <= LOG_BODY_LIMIT {
        return text.to_string();
    }
    let head: String = text.chars().take(LOG_BODY_LIMIT).collect();
    format!("{}... ({} chars total)", head, text.chars().count())
}

/// Pluralize a count with its noun, e.g. "1 candidate" / "3 candidates"
pub fn count_noun(count: usize, noun: &str) -> String {
    if count == 1 {
        format!("{} {}", count, noun)
    } else {
        format!("{} {}s", count, noun)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_file_extension() {
        assert_eq!(get_file_extension("test.pdf"), Some("pdf".to_string()));
        assert_eq!(
            get_file_extension("document.DOCX"),
            Some("docx".to_string())
        );
        assert_eq!(get_file_extension("noext"), None);
    }

    #[test]
    fn test_format_file_size() {
        assert_eq!(format_file_size(512), "512B");
        assert_eq!(format_file_size(2048), "2.0KB");
        assert_eq!(format_file_size(10 * 1024 * 1024), "10.0MB");
    }

    #[test]
    fn test_truncate_for_log() {
        assert_eq!(truncate_for_log("short"), "short");
        let long = "x".repeat(600);
        let cut = truncate_for_log(&long);
        assert!(cut.starts_with(&"x".repeat(512)));
        assert!(cut.ends_with("(600 chars total)"));
    }

    #[test]
    fn test_count_noun() {
        assert_eq!(count_noun(1, "candidate"), "1 candidate");
        assert_eq!(count_noun(0, "file"), "0 files");
    }
}
