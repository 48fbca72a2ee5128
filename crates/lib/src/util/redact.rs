//! Identifier redaction for log output.

/// Number of leading characters left readable.
const VISIBLE_PREFIX: usize = 4;

/// Obscure an identifier (ARN, distribution id, role) for logging.
///
/// Only the first few characters survive.
pub fn redact(value: &str) -> String {
  let visible: String = value.chars().take(VISIBLE_PREFIX).collect();
  if value.chars().count() <= VISIBLE_PREFIX {
    return "****".to_string();
  }
  format!("{}****", visible)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn keeps_short_prefix() {
    assert_eq!(redact("E2QWRUHAPOMQZL"), "E2QW****");
  }

  #[test]
  fn hides_short_values_entirely() {
    assert_eq!(redact("abc"), "****");
    assert_eq!(redact(""), "****");
  }

  #[test]
  fn hides_account_id_in_arn() {
    let redacted = redact("arn:aws:lambda:us-east-1:123456789012:function:site-edge-router:3");
    assert!(!redacted.contains("123456789012"));
  }
}
