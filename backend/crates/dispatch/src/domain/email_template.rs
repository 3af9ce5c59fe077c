//! Email Rendering
//!
//! HTML and plain-text bodies for relayed messages. User-supplied text is
//! HTML-escaped before newlines become `<br>`.

use chrono::{DateTime, Utc};

/// Everything the templates need
#[derive(Debug, Clone)]
pub struct EmailContext<'a> {
    pub app_name: &'a str,
    pub sender_name: &'a str,
    /// Address shown next to the sender name; empty when unknown
    pub sender_email: &'a str,
    pub message: &'a str,
    /// Caller asked for replies to go somewhere specific
    pub has_reply_to: bool,
    pub sent_at: DateTime<Utc>,
}

impl EmailContext<'_> {
    fn from_line(&self, escape: bool) -> String {
        let (name, email) = if escape {
            (escape_html(self.sender_name), escape_html(self.sender_email))
        } else {
            (self.sender_name.to_string(), self.sender_email.to_string())
        };
        if email.is_empty() {
            name
        } else {
            format!("{name} ({email})")
        }
    }

    fn date_line(&self) -> String {
        self.sent_at.format("%-d %B %Y, %H:%M UTC").to_string()
    }
}

/// Escape the five HTML-significant characters
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

pub fn render_html(ctx: &EmailContext<'_>) -> String {
    let app_name = escape_html(ctx.app_name);
    let body = escape_html(ctx.message)
        .replace("\r\n", "\n")
        .replace('\n', "<br>");
    let reply_hint = if ctx.has_reply_to && !ctx.sender_email.is_empty() {
        format!(
            "<p>Click \"Reply\" to respond directly to {}</p>",
            escape_html(ctx.sender_email)
        )
    } else {
        String::new()
    };

    format!(
        r#"<!DOCTYPE html>
<html>
<head>
  <meta charset="utf-8">
  <style>
    body {{ font-family: Arial, sans-serif; line-height: 1.6; color: #333; }}
    .container {{ max-width: 600px; margin: 0 auto; padding: 20px; }}
    .header {{ background: #3498db; color: white; padding: 20px; text-align: center; border-radius: 8px 8px 0 0; }}
    .content {{ background: #f9f9f9; padding: 30px; border: 1px solid #ddd; }}
    .message-box {{ background: white; padding: 20px; border-left: 4px solid #3498db; margin: 20px 0; }}
    .footer {{ background: #f1f1f1; padding: 15px; text-align: center; font-size: 12px; color: #666; border-radius: 0 0 8px 8px; }}
    .meta {{ color: #666; font-size: 14px; margin-bottom: 10px; }}
  </style>
</head>
<body>
  <div class="container">
    <div class="header">
      <h2 style="margin: 0;">{app_name}</h2>
    </div>
    <div class="content">
      <div class="meta">
        <strong>From:</strong> {from}<br>
        <strong>Date:</strong> {date}
      </div>
      <div class="message-box">
        {body}
      </div>
    </div>
    <div class="footer">
      {reply_hint}
      <p>This email was sent via {app_name}</p>
    </div>
  </div>
</body>
</html>
"#,
        from = ctx.from_line(true),
        date = ctx.date_line(),
    )
}

pub fn render_plain_text(ctx: &EmailContext<'_>) -> String {
    let rule = "─".repeat(32);
    let reply_hint = if ctx.has_reply_to && !ctx.sender_email.is_empty() {
        format!("Reply to this email to contact {}\n", ctx.sender_email)
    } else {
        String::new()
    };

    format!(
        "{app} Message\n\nFrom: {from}\nDate: {date}\n\n{rule}\n\n{message}\n\n{rule}\n{reply_hint}\nThis email was sent via {app}\n",
        app = ctx.app_name,
        from = ctx.from_line(false),
        date = ctx.date_line(),
        message = ctx.message,
    )
}
