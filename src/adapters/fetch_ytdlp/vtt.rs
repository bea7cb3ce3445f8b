//! WebVTT caption parsing.
//!
//! yt-dlp writes captions as WebVTT. Auto-generated YouTube tracks repeat the
//! previous line at the top of every cue, so consecutive duplicate lines are
//! collapsed while parsing.

use crate::domain::model::TranscriptCue;

/// Parse `HH:MM:SS.mmm` or `MM:SS.mmm` (a comma is accepted for the fraction)
pub fn parse_timestamp(value: &str) -> Option<f64> {
    let value = value.trim().replace(',', ".");
    let parts: Vec<&str> = value.split(':').collect();
    let (hours, minutes, seconds) = match parts.as_slice() {
        [m, s] => (0.0, m.parse::<f64>().ok()?, s.parse::<f64>().ok()?),
        [h, m, s] => (
            h.parse::<f64>().ok()?,
            m.parse::<f64>().ok()?,
            s.parse::<f64>().ok()?,
        ),
        _ => return None,
    };
    Some(hours * 3600.0 + minutes * 60.0 + seconds)
}

fn parse_timing_line(line: &str) -> Option<(f64, f64)> {
    let (start, rest) = line.split_once("-->")?;
    let end = rest.split_whitespace().next()?;
    Some((parse_timestamp(start)?, parse_timestamp(end)?))
}

/// Drop inline tags such as `<c>` or `<00:00:01.520>` and decode common entities
fn clean_text(line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    let mut in_tag = false;
    for c in line.chars() {
        match c {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            _ if !in_tag => out.push(c),
            _ => {}
        }
    }
    out.replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&nbsp;", " ")
        .replace("&#39;", "'")
        .replace("&quot;", "\"")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Parse a WebVTT document into timed cues
pub fn parse_cues(vtt: &str) -> Vec<TranscriptCue> {
    let mut cues = Vec::new();
    let mut last_line: Option<String> = None;

    let normalized = vtt.replace("\r\n", "\n");
    for block in normalized.split("\n\n") {
        let mut lines = block.lines().map(str::trim).filter(|l| !l.is_empty());

        let timing = loop {
            match lines.next() {
                Some(line) if line.contains("-->") => break parse_timing_line(line),
                // cue identifiers, headers and NOTE/STYLE bodies
                Some(_) => continue,
                None => break None,
            }
        };
        let Some((start, end)) = timing else {
            continue;
        };

        let mut text_lines = Vec::new();
        for raw in lines {
            let cleaned = clean_text(raw);
            if cleaned.is_empty() || last_line.as_deref() == Some(cleaned.as_str()) {
                continue;
            }
            last_line = Some(cleaned.clone());
            text_lines.push(cleaned);
        }

        if text_lines.is_empty() {
            continue;
        }

        cues.push(TranscriptCue {
            text: text_lines.join(" "),
            start,
            duration: ((end - start) * 1000.0).round().max(0.0) / 1000.0,
        });
    }

    cues
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamps() {
        assert_eq!(parse_timestamp("00:00:01.500"), Some(1.5));
        assert_eq!(parse_timestamp("01:02.250"), Some(62.25));
        assert_eq!(parse_timestamp("01:00:00,000"), Some(3600.0));
        assert_eq!(parse_timestamp("garbage"), None);
    }

    #[test]
    fn parses_manual_captions() {
        let vtt = "WEBVTT\nKind: captions\nLanguage: en\n\n1\n00:00:00.000 --> 00:00:02.000\nHello &amp; welcome\n\n2\n00:00:02.000 --> 00:00:04.500 align:start position:0%\n<i>to the show</i>\n";
        let cues = parse_cues(vtt);
        assert_eq!(
            cues,
            vec![
                TranscriptCue {
                    text: "Hello & welcome".to_string(),
                    start: 0.0,
                    duration: 2.0
                },
                TranscriptCue {
                    text: "to the show".to_string(),
                    start: 2.0,
                    duration: 2.5
                },
            ]
        );
    }

    #[test]
    fn collapses_rolling_auto_captions() {
        let vtt = "WEBVTT\n\n00:00:00.000 --> 00:00:01.990\nhello<00:00:00.500><c> world</c>\n\n00:00:01.990 --> 00:00:02.000\nhello world\n\n00:00:02.000 --> 00:00:04.000\nhello world\nhow are you\n";
        let texts: Vec<String> = parse_cues(vtt).into_iter().map(|c| c.text).collect();
        assert_eq!(texts, vec!["hello world", "how are you"]);
    }

    #[test]
    fn skips_notes_and_styles() {
        let vtt = "WEBVTT\n\nNOTE this is a comment\n\nSTYLE\n::cue { color: red }\n\n00:01.000 --> 00:02.000\nline\n";
        let cues = parse_cues(vtt);
        assert_eq!(cues.len(), 1);
        assert_eq!(cues[0].start, 1.0);
    }
}
