//! Alert and welcome email composition, and the dispatch seam

use crate::error::Result;
use crate::model::{Trigger, User};
use async_trait::async_trait;
use minijinja::{Environment, context};
use serde::{Deserialize, Serialize};
use tracing::info;

const ALERT_HTML: &str = r#"<!DOCTYPE html>
<html>
<head>
    <style>
        body { font-family: Arial, sans-serif; line-height: 1.6; color: #333; }
        .container { max-width: 600px; margin: 0 auto; padding: 20px; }
        .header { background: linear-gradient(135deg, #667eea 0%, #764ba2 100%); color: white; padding: 20px; border-radius: 10px 10px 0 0; }
        .content { background: #f9f9f9; padding: 20px; border-radius: 0 0 10px 10px; }
        .symbols { background: #e8e8e8; padding: 10px; border-radius: 5px; margin: 10px 0; }
        .footer { margin-top: 20px; font-size: 12px; color: #666; }
    </style>
</head>
<body>
    <div class="container">
        <div class="header"><h2>Stock AI Alert - {{ label }}</h2></div>
        <div class="content">
            <p>Hello {{ name }},</p>
            <p>Here is your {{ label }} stock market update:</p>
            <div class="symbols"><strong>Symbols:</strong> {{ symbols }}</div>
            <div style="white-space: pre-wrap;">{{ content }}</div>
        </div>
        <div class="footer">
            <p>This is an automated alert from Stock AI Analyst.</p>
            <p>To manage your alerts, visit the Scheduler page in the application.</p>
        </div>
    </div>
</body>
</html>
"#;

const WELCOME_HTML: &str = r#"<!DOCTYPE html>
<html>
<head>
    <style>
        body { font-family: Arial, sans-serif; line-height: 1.6; color: #333; }
        .container { max-width: 600px; margin: 0 auto; padding: 20px; }
        .header { background: linear-gradient(135deg, #667eea 0%, #764ba2 100%); color: white; padding: 20px; border-radius: 10px 10px 0 0; text-align: center; }
        .content { background: #f9f9f9; padding: 20px; border-radius: 0 0 10px 10px; }
        .feature { background: white; padding: 15px; margin: 10px 0; border-radius: 5px; border-left: 4px solid #667eea; }
        .footer { margin-top: 20px; font-size: 12px; color: #666; text-align: center; }
    </style>
</head>
<body>
    <div class="container">
        <div class="header"><h1>Welcome to Stock AI Analyst</h1></div>
        <div class="content">
            <p>Hello {{ name }},</p>
            <p>Your account has been successfully created. You can now:</p>
            {% for feature in features %}
            <div class="feature"><strong>{{ feature[0] }}</strong><br>{{ feature[1] }}</div>
            {% endfor %}
        </div>
        <div class="footer"><p>Best regards,<br>Stock AI Analyst Team</p></div>
    </div>
</body>
</html>
"#;

const WELCOME_FEATURES: [(&str, &str); 4] = [
    ("Market Dashboard", "View real-time market summaries and indices"),
    ("AI Analyst Chat", "Get personalized stock insights and recommendations"),
    ("Market Explorer", "Explore stocks, ETFs, and funds with detailed analysis"),
    ("Scheduler", "Set up automated morning and evening alerts"),
];

/// A composed message ready for delivery
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutgoingEmail {
    pub to: String,
    pub subject: String,
    pub text_body: String,
    pub html_body: Option<String>,
}

/// Delivers composed emails
///
/// Returns `Ok(true)` once the message is handed to a transport and
/// `Ok(false)` when delivery was skipped.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EmailDispatcher: Send + Sync {
    async fn send(&self, email: OutgoingEmail) -> Result<bool>;
}

/// Dispatcher for deployments without a mail relay: logs and reports the
/// message as not sent
#[derive(Debug, Clone, Copy, Default)]
pub struct LogDispatcher;

#[async_trait]
impl EmailDispatcher for LogDispatcher {
    async fn send(&self, email: OutgoingEmail) -> Result<bool> {
        info!(
            to = %email.to,
            subject = %email.subject,
            bytes = email.text_body.len(),
            "Email transport not configured, skipping send"
        );
        Ok(false)
    }
}

/// Scheduled market update for `user`
pub fn compose_market_alert(
    user: &User,
    content: &str,
    trigger: Trigger,
    symbols: &[String],
) -> Result<OutgoingEmail> {
    let label = trigger.label();
    let symbols = if symbols.is_empty() {
        "General Market".to_string()
    } else {
        symbols.join(", ")
    };

    let text_body = format!(
        "Hello {name},\n\nHere is your {label} stock market update:\n\nSymbols: {symbols}\n\n{content}\n\n---\n\
         This is an automated alert from Stock AI Analyst.\n\
         To manage your alerts, visit the Scheduler page in the application.\n",
        name = user.name,
    );
    let html_body = render_html(
        "alert.html",
        ALERT_HTML,
        context! { name => &user.name, label, symbols, content },
    )?;

    Ok(OutgoingEmail {
        to: user.email.clone(),
        subject: format!("Stock AI Alert - {label} Update"),
        text_body,
        html_body: Some(html_body),
    })
}

/// Greeting sent after registration
pub fn compose_welcome(user: &User) -> Result<OutgoingEmail> {
    let mut text_body = format!(
        "Hello {},\n\nWelcome to Stock AI Analyst!\n\nYour account has been successfully created. You can now:\n",
        user.name
    );
    text_body.push_str(
        "1. View the Market Dashboard for real-time market summaries\n\
         2. Chat with our AI Analyst for personalized stock insights\n\
         3. Explore stocks, ETFs, and funds in the Market Explorer\n\
         4. Set up automated alerts in the Scheduler\n\n\
         Get started by logging into your account and exploring the features.\n\n\
         Best regards,\nStock AI Analyst Team\n",
    );

    let html_body = render_html(
        "welcome.html",
        WELCOME_HTML,
        context! { name => &user.name, features => WELCOME_FEATURES },
    )?;

    Ok(OutgoingEmail {
        to: user.email.clone(),
        subject: "Welcome to Stock AI Analyst".to_string(),
        text_body,
        html_body: Some(html_body),
    })
}

// The `.html` name turns on MiniJinja auto-escaping for model output.
fn render_html(name: &'static str, source: &'static str, ctx: minijinja::Value) -> Result<String> {
    let mut env = Environment::new();
    env.add_template(name, source)?;
    Ok(env.get_template(name)?.render(ctx)?)
}
