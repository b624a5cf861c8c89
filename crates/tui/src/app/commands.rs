//! Slash commands typed into the input box.

use lyft_core::assistant::{Progress, VideoRef};

#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    Roadmap {
        title: String,
        description: Option<String>,
        custom: bool,
    },
    Topic(String),
    Video(VideoRef),
    Progress(Progress),
    ContextClear,
    Clear,
    Model(String),
    Temperature(f32),
    MaxTokens(u32),
    Suggest,
    Help,
}

/// `None` when `text` is not a slash command; `Some(Err(usage))` when it is
/// one but malformed.
pub fn parse(text: &str) -> Option<Result<Command, String>> {
    let s = text.trim();
    let rest = s.strip_prefix('/')?;
    let mut parts = rest.splitn(2, char::is_whitespace);
    let cmd = parts.next().unwrap_or("").to_lowercase();
    let arg = parts.next().unwrap_or("").trim();
    let fields: Vec<&str> = arg
        .split('|')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();
    let parsed = match cmd.as_str() {
        "roadmap" | "custom" => match fields.first() {
            Some(title) => Ok(Command::Roadmap {
                title: title.to_string(),
                description: fields.get(1).map(|d| d.to_string()),
                custom: cmd == "custom",
            }),
            None => Err(format!("usage: /{} <title> [| description]", cmd)),
        },
        "topic" if !arg.is_empty() => Ok(Command::Topic(arg.to_string())),
        "topic" => Err("usage: /topic <text>".to_string()),
        "video" => match fields.first() {
            Some(title) => Ok(Command::Video(VideoRef {
                title: title.to_string(),
                url: fields.get(1).map(|u| u.to_string()),
                channel: fields.get(2).map(|c| c.to_string()),
            })),
            None => Err("usage: /video <title> [| url [| channel]]".to_string()),
        },
        "progress" => parse_progress(arg)
            .map(Command::Progress)
            .ok_or_else(|| "usage: /progress <done>/<total>".to_string()),
        "context" if arg.eq_ignore_ascii_case("clear") => Ok(Command::ContextClear),
        "context" => Err("usage: /context clear".to_string()),
        "clear" => Ok(Command::Clear),
        "model" if !arg.is_empty() => Ok(Command::Model(arg.to_string())),
        "model" => Err("usage: /model <name>".to_string()),
        "temp" => arg
            .parse::<f32>()
            .ok()
            .filter(|t| t.is_finite() && (0.0..=2.0).contains(t))
            .map(Command::Temperature)
            .ok_or_else(|| "usage: /temp <0.0..2.0>".to_string()),
        "max" => arg
            .parse::<u32>()
            .ok()
            .filter(|n| *n > 0)
            .map(Command::MaxTokens)
            .ok_or_else(|| "usage: /max <tokens>".to_string()),
        "suggest" => Ok(Command::Suggest),
        "help" => Ok(Command::Help),
        other => Err(format!("unknown command '/{}'", other)),
    };
    Some(parsed)
}

fn parse_progress(arg: &str) -> Option<Progress> {
    let (done, total) = arg.split_once('/')?;
    let completed = done.trim().parse().ok()?;
    let total = total.trim().parse().ok()?;
    Some(Progress { completed, total })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn plain_text_is_not_a_command() {
        assert!(parse("how do closures work?").is_none());
    }

    #[test]
    fn roadmap_with_description() {
        assert_eq!(
            parse("/roadmap Full Stack | MERN from scratch"),
            Some(Ok(Command::Roadmap {
                title: "Full Stack".into(),
                description: Some("MERN from scratch".into()),
                custom: false,
            }))
        );
        assert!(matches!(
            parse("/custom My Path"),
            Some(Ok(Command::Roadmap { custom: true, .. }))
        ));
        assert!(matches!(parse("/roadmap"), Some(Err(_))));
    }

    #[test]
    fn video_fields_are_positional() {
        assert_eq!(
            parse("/video Rust in 100 Seconds | https://youtu.be/x | Fireship"),
            Some(Ok(Command::Video(VideoRef {
                title: "Rust in 100 Seconds".into(),
                url: Some("https://youtu.be/x".into()),
                channel: Some("Fireship".into()),
            })))
        );
    }

    #[test]
    fn numeric_arguments_are_checked() {
        assert_eq!(
            parse("/progress 4 / 10"),
            Some(Ok(Command::Progress(Progress { completed: 4, total: 10 })))
        );
        assert!(matches!(parse("/progress four"), Some(Err(_))));
        assert_eq!(parse("/temp 0.4"), Some(Ok(Command::Temperature(0.4))));
        assert!(matches!(parse("/temp 3"), Some(Err(_))));
        assert!(matches!(parse("/max 0"), Some(Err(_))));
        assert_eq!(parse("/MAX 512"), Some(Ok(Command::MaxTokens(512))));
    }

    #[test]
    fn unknown_command_reports_name() {
        assert_eq!(parse("/wat now"), Some(Err("unknown command '/wat'".to_string())));
    }
}
