//! Small utility helpers used across modules.

/// Very small and safe string templating.
/// Replaces occurrences of `{key}` in the template with provided values.
/// This is intentionally simple (no nested/conditional logic).
pub fn fill_template(tpl: &str, pairs: &[(&str, &str)]) -> String {
  let mut out = tpl.to_string();
  for (k, v) in pairs {
    let needle = format!("{{{}}}", k);
    out = out.replace(&needle, v);
  }
  out
}

/// Extract the 11-character YouTube video id from the usual URL shapes
/// (`youtu.be/<id>`, `watch?v=<id>`, `embed/<id>`, `shorts/<id>`).
pub fn extract_youtube_id(url: &str) -> Option<&str> {
  let start = ["youtu.be/", "watch?v=", "embed/", "shorts/", "/v/"]
    .iter()
    .find_map(|marker| url.find(marker).map(|i| i + marker.len()))?;
  let rest = &url[start..];
  let end = rest
    .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_' || c == '-'))
    .unwrap_or(rest.len());
  let id = &rest[..end];
  if id.len() == 11 { Some(id) } else { None }
}

/// Log-safe truncation for large strings.
/// Avoids spamming logs with huge request/response payloads.
pub fn trunc_for_log(s: &str, max: usize) -> String {
  if s.len() <= max {
    return s.to_string();
  }
  let mut cut = max;
  while !s.is_char_boundary(cut) {
    cut -= 1;
  }
  format!("{}… ({} bytes total)", &s[..cut], s.len())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn youtube_id_extraction_covers_common_shapes() {
    assert_eq!(
      extract_youtube_id("https://www.youtube.com/watch?v=SqcY0GlETPk"),
      Some("SqcY0GlETPk")
    );
    assert_eq!(extract_youtube_id("https://youtu.be/w7ejDZ8SWv8"), Some("w7ejDZ8SWv8"));
    assert_eq!(
      extract_youtube_id("https://www.youtube.com/embed/bMknfKXIFA8?rel=0"),
      Some("bMknfKXIFA8")
    );
    assert_eq!(extract_youtube_id("https://example.com/video.mp4"), None);
    assert_eq!(extract_youtube_id("https://youtu.be/short"), None);
  }
}
