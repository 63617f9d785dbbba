use time::format_description::OwnedFormatItem;
use time::OffsetDateTime;

use crate::error::HistoryStoreError;

/// Date pattern used when configuration does not supply one.
///
/// There is no separator between the date and time halves; the name shape is
/// an external interface and stays as is.
pub const DEFAULT_DATE_PATTERN: &str = "yyyy-MM-ddHH:mm:ss";

/// Builds timestamped names for archived history files and extracted code.
#[derive(Debug, Clone)]
pub struct FileNamer {
    pattern: String,
    format: OwnedFormatItem,
}

impl FileNamer {
    /// Compiles a Java-style date pattern such as `yyyy-MM-dd HH:mm:ss`.
    ///
    /// Letters outside the supported set are rejected here so that formatting
    /// a name later can only fail on the clock value itself. Optional sections
    /// (`[` and `]`) are not supported and must be quoted to appear literally.
    pub fn new(pattern: &str) -> Result<Self, HistoryStoreError> {
        let description = translate_pattern(pattern)?;
        let format = time::format_description::parse_owned::<1>(&description).map_err(
            |error| HistoryStoreError::InvalidDatePattern {
                pattern: pattern.to_string(),
                reason: error.to_string(),
            },
        )?;

        Ok(Self {
            pattern: pattern.to_string(),
            format,
        })
    }

    #[must_use]
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn timestamp(&self, now: OffsetDateTime) -> Result<String, HistoryStoreError> {
        now.format(&self.format)
            .map_err(HistoryStoreError::ClockFormat)
    }

    /// `<base>.<timestamp>`
    pub fn history_archive_name(
        &self,
        base_name: &str,
        now: OffsetDateTime,
    ) -> Result<String, HistoryStoreError> {
        Ok(format!("{base_name}.{}", self.timestamp(now)?))
    }

    /// `<timestamp>` or `<timestamp>.<tag>` when a language tag is present.
    pub fn code_file_name(
        &self,
        language_tag: &str,
        now: OffsetDateTime,
    ) -> Result<String, HistoryStoreError> {
        let stamp = self.timestamp(now)?;
        if language_tag.is_empty() {
            Ok(stamp)
        } else {
            Ok(format!("{stamp}.{language_tag}"))
        }
    }
}

/// Current wall-clock time in the local offset, falling back to UTC when the
/// offset cannot be determined (multi-threaded processes on some platforms).
#[must_use]
pub fn local_now() -> OffsetDateTime {
    OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc())
}

fn translate_pattern(pattern: &str) -> Result<String, HistoryStoreError> {
    let invalid = |reason: String| HistoryStoreError::InvalidDatePattern {
        pattern: pattern.to_string(),
        reason,
    };

    let chars = pattern.chars().collect::<Vec<_>>();
    let mut out = String::new();
    let mut index = 0;

    while index < chars.len() {
        let current = chars[index];

        if current == '\'' {
            // '' is an escaped quote; anything else opens a quoted literal.
            if chars.get(index + 1) == Some(&'\'') {
                out.push('\'');
                index += 2;
                continue;
            }

            index += 1;
            let mut closed = false;
            while index < chars.len() {
                if chars[index] == '\'' {
                    if chars.get(index + 1) == Some(&'\'') {
                        out.push('\'');
                        index += 2;
                        continue;
                    }
                    closed = true;
                    index += 1;
                    break;
                }
                push_literal(&mut out, chars[index]);
                index += 1;
            }

            if !closed {
                return Err(invalid("unterminated quoted literal".to_string()));
            }
            continue;
        }

        if current == '[' || current == ']' {
            return Err(invalid(format!(
                "optional section marker '{current}' must be quoted"
            )));
        }

        if !current.is_ascii_alphabetic() {
            push_literal(&mut out, current);
            index += 1;
            continue;
        }

        let run = chars[index..]
            .iter()
            .take_while(|candidate| **candidate == current)
            .count();
        index += run;

        let component = match (current, run) {
            ('y', 2) => "[year repr:last_two]".to_string(),
            ('y', _) => "[year]".to_string(),
            ('M', 1) => "[month padding:none]".to_string(),
            ('M', 2) => "[month]".to_string(),
            ('M', 3) => "[month repr:short]".to_string(),
            ('M', _) => "[month repr:long]".to_string(),
            ('d', 1) => "[day padding:none]".to_string(),
            ('d', _) => "[day]".to_string(),
            ('H', 1) => "[hour padding:none]".to_string(),
            ('H', _) => "[hour]".to_string(),
            ('h', 1) => "[hour repr:12 padding:none]".to_string(),
            ('h', _) => "[hour repr:12]".to_string(),
            ('m', 1) => "[minute padding:none]".to_string(),
            ('m', _) => "[minute]".to_string(),
            ('s', 1) => "[second padding:none]".to_string(),
            ('s', _) => "[second]".to_string(),
            ('S', 1..=9) => format!("[subsecond digits:{run}]"),
            ('a', _) => "[period]".to_string(),
            ('E', 1..=3) => "[weekday repr:short]".to_string(),
            ('E', _) => "[weekday repr:long]".to_string(),
            _ => {
                return Err(invalid(format!(
                    "unsupported pattern letters '{}'",
                    current.to_string().repeat(run)
                )))
            }
        };
        out.push_str(&component);
    }

    Ok(out)
}

fn push_literal(out: &mut String, ch: char) {
    if ch == '[' {
        out.push_str("[[");
    } else {
        out.push(ch);
    }
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;

    use super::*;

    #[test]
    fn default_pattern_has_no_date_time_separator() {
        let namer = FileNamer::new(DEFAULT_DATE_PATTERN).expect("default pattern");
        let stamp = namer
            .timestamp(datetime!(2026-03-07 09:05:04 UTC))
            .expect("format");
        assert_eq!(stamp, "2026-03-0709:05:04");
    }

    #[test]
    fn quoted_literals_and_brackets_pass_through() {
        let namer = FileNamer::new("yyyyMMdd'T'HHmm '[x]' 'it''s'").expect("pattern");
        let stamp = namer
            .timestamp(datetime!(2026-03-07 09:05:04 UTC))
            .expect("format");
        assert_eq!(stamp, "20260307T0905 [x] it's");
    }

    #[test]
    fn twelve_hour_clock_with_period() {
        let namer = FileNamer::new("h:mm a").expect("pattern");
        let stamp = namer
            .timestamp(datetime!(2026-03-07 15:30:00 UTC))
            .expect("format");
        assert_eq!(stamp, "3:30 PM");
    }

    #[test]
    fn milliseconds_use_three_digits() {
        let namer = FileNamer::new("ss.SSS").expect("pattern");
        let stamp = namer
            .timestamp(datetime!(2026-03-07 15:30:07.042 UTC))
            .expect("format");
        assert_eq!(stamp, "07.042");
    }

    #[test]
    fn unsupported_letters_are_rejected() {
        let error = FileNamer::new("yyyy-QQ").expect_err("Q is not supported");
        assert!(matches!(error, HistoryStoreError::InvalidDatePattern { reason, .. } if reason.contains("QQ")));
    }

    #[test]
    fn unterminated_quote_is_rejected() {
        let error = FileNamer::new("yyyy'oops").expect_err("open quote");
        assert!(matches!(error, HistoryStoreError::InvalidDatePattern { .. }));
    }

    #[test]
    fn unquoted_letters_are_never_literal() {
        let error = FileNamer::new("yyyyMMdd [x]").expect_err("bare x");
        assert!(matches!(error, HistoryStoreError::InvalidDatePattern { .. }));
    }

    #[test]
    fn unquoted_optional_sections_are_rejected() {
        for pattern in ["yyyy[-MM]", "yyyy]"] {
            let error = FileNamer::new(pattern).expect_err("optional section");
            assert!(
                matches!(&error, HistoryStoreError::InvalidDatePattern { reason, .. } if reason.contains("must be quoted")),
                "{pattern}: {error:?}"
            );
        }
    }
}
