//! JSON recovery from model output.
//!
//! Even in JSON mode, models occasionally wrap the object in markdown
//! fences or lead with prose. Rather than fail the whole classification,
//! scan for the first balanced JSON object and parse that.

/// Extract the first balanced `{...}` object from `content`, tolerating
/// markdown code fences and surrounding prose. Returns `None` when no
/// balanced object exists.
pub fn extract_json_object(content: &str) -> Option<&str> {
    // Strip a ```json ... ``` (or bare ```) fence if present
    let content = if let Some(fenced) = content.split("```json").nth(1) {
        fenced.split("```").next().unwrap_or(fenced)
    } else if let Some(fenced) = content.split("```").nth(1) {
        fenced
    } else {
        content
    };

    let start = content.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, ch) in content[start..].char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match ch {
            '\\' if in_string => escaped = true,
            '"' => in_string = !in_string,
            '{' if !in_string => depth += 1,
            '}' if !in_string => {
                depth -= 1;
                if depth == 0 {
                    return Some(&content[start..start + i + ch.len_utf8()]);
                }
            }
            _ => {}
        }
    }

    None
}
