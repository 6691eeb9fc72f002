//! Alert eligibility and channel formatting.
//!
//! Only downside moves alert: a ticker is eligible when its change is at or
//! below minus its configured minimum drop (and, if an upper bound is set, not
//! beyond it). Eligible tickers are rendered as a plain-text block for chat
//! and an HTML block for email; a run with no eligible tickers produces no
//! digest at all.

use crate::domain::{Decision, Headline, SignalBundle};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Line between per-ticker blocks in the plain-text digest.
pub const TEXT_SEPARATOR: &str = "----------------------------------------";

/// Per-ticker drop band, in percent (positive numbers).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DropThreshold {
    pub min_drop_pct: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_drop_pct: Option<f64>,
}

impl DropThreshold {
    pub fn new(min_drop_pct: f64) -> Self {
        Self {
            min_drop_pct,
            max_drop_pct: None,
        }
    }

    pub fn with_max(mut self, max_drop_pct: f64) -> Self {
        self.max_drop_pct = Some(max_drop_pct);
        self
    }

    /// Thresholds must be positive and the band non-empty.
    pub fn is_valid(&self) -> bool {
        self.min_drop_pct.is_finite()
            && self.min_drop_pct > 0.0
            && self
                .max_drop_pct
                .map_or(true, |max| max.is_finite() && max >= self.min_drop_pct)
    }

    /// True when `change_pct` is a drop inside the band.
    pub fn is_crossed(&self, change_pct: f64) -> bool {
        change_pct <= -self.min_drop_pct
            && self.max_drop_pct.map_or(true, |max| change_pct >= -max)
    }
}

/// Drop-gate policy for a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertGate {
    /// Alert every ticker with a computable change, ignoring thresholds.
    pub bypass_threshold: bool,
}

impl AlertGate {
    pub fn is_eligible(&self, bundle: &SignalBundle, threshold: &DropThreshold) -> bool {
        if !bundle.change_pct.is_finite() {
            return false;
        }
        self.bypass_threshold || threshold.is_crossed(bundle.change_pct)
    }
}

/// Everything needed to render one ticker's alert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub bundle: SignalBundle,
    pub decision: Decision,
    pub headlines: Vec<Headline>,
}

impl Alert {
    fn direction(&self) -> &'static str {
        let change = self.bundle.change_pct;
        if change < 0.0 {
            "dropped"
        } else if change > 0.0 {
            "rose"
        } else {
            "unchanged"
        }
    }

    fn oscillator_text(&self) -> String {
        match self.bundle.oscillator {
            Some(v) => format!("{v:.2}"),
            None => "n/a".to_string(),
        }
    }

    fn volume_text(&self) -> String {
        match self.bundle.volume_ratio {
            Some(v) => format!("{v:.2}x"),
            None => "n/a".to_string(),
        }
    }

    fn headline_line(&self) -> String {
        let b = &self.bundle;
        if b.change_pct == 0.0 {
            return format!("{} unchanged at ${:.2} (0.00%)", b.symbol, b.latest_close);
        }
        format!(
            "{} {} to ${:.2} ({:+.2}%) from ${:.2}",
            b.symbol,
            self.direction(),
            b.latest_close,
            b.change_pct,
            b.previous_close
        )
    }
}

/// Plain-text block for chat channels.
pub fn render_text(alert: &Alert) -> String {
    format!(
        "{}\nRSI: {} | Volume: {} | Sentiment: {:+.2}\n{}\nRecommendation: {}",
        alert.headline_line(),
        alert.oscillator_text(),
        alert.volume_text(),
        alert.bundle.sentiment,
        alert.decision.narrative,
        alert.decision.recommendation
    )
}

/// HTML block for email, with linked headlines.
pub fn render_html(alert: &Alert) -> String {
    let mut html = format!(
        "<h3>{}</h3>\n<p>RSI: {} | Volume: {} | Sentiment: {:+.2}<br>\n{}</p>\n<p><b>Recommendation:</b> {}</p>\n",
        escape_html(&alert.headline_line()),
        alert.oscillator_text(),
        alert.volume_text(),
        alert.bundle.sentiment,
        escape_html(&alert.decision.narrative),
        alert.decision.recommendation
    );
    if !alert.headlines.is_empty() {
        html.push_str("<ul>\n");
        for h in &alert.headlines {
            html.push_str(&format!(
                "<li><a href=\"{}\">{}</a></li>\n",
                escape_html(&h.link),
                escape_html(&h.title)
            ));
        }
        html.push_str("</ul>\n");
    }
    html
}

fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
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

/// Rendered output for every channel in one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertDigest {
    pub subject: String,
    pub text: String,
    pub html: String,
    pub count: usize,
}

/// Combine rendered alerts. `None` when there is nothing to send.
pub fn compose(alerts: &[Alert], at: NaiveDateTime) -> Option<AlertDigest> {
    if alerts.is_empty() {
        return None;
    }
    let stamp = at.format("%Y-%m-%d %H:%M");

    let blocks: Vec<String> = alerts.iter().map(render_text).collect();
    let text = format!(
        "[{stamp}] ALERT:\n{}",
        blocks.join(&format!("\n{TEXT_SEPARATOR}\n"))
    );

    let html = format!(
        "<p>[{stamp}] ALERT</p>\n{}",
        alerts.iter().map(render_html).collect::<String>()
    );

    Some(AlertDigest {
        subject: format!("\u{1F4C9} Stock Drop Alert ({})", alerts.len()),
        text,
        html,
        count: alerts.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Recommendation;
    use chrono::NaiveDate;

    fn bundle(change: f64) -> SignalBundle {
        SignalBundle {
            symbol: "NVDA".into(),
            change_pct: change,
            previous_close: 100.0,
            latest_close: 100.0 + change,
            volume_ratio: Some(1.8),
            oscillator: Some(28.5),
            oscillator_sources: 3,
            sentiment: 0.42,
        }
    }

    fn alert(change: f64) -> Alert {
        Alert {
            bundle: bundle(change),
            decision: Decision {
                recommendation: Recommendation::BuyOpportunity,
                narrative: "RSI oversold, volume elevated, news sentiment positive.".into(),
            },
            headlines: vec![Headline {
                title: "Chips & <AI> rally".into(),
                link: "https://news.example/a?b=1&c=2".into(),
            }],
        }
    }

    fn at() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 15)
            .unwrap()
            .and_hms_opt(15, 45, 0)
            .unwrap()
    }

    #[test]
    fn threshold_gate_examples() {
        let gate = AlertGate::default();
        let t = DropThreshold::new(3.0);
        assert!(!gate.is_eligible(&bundle(-1.0), &t));
        assert!(gate.is_eligible(&bundle(-4.0), &t));
        assert!(gate.is_eligible(&bundle(-3.0), &t));
        assert!(!gate.is_eligible(&bundle(5.0), &t));
    }

    #[test]
    fn max_drop_bounds_the_band() {
        let gate = AlertGate::default();
        let t = DropThreshold::new(1.0).with_max(3.0);
        assert!(gate.is_eligible(&bundle(-2.0), &t));
        assert!(gate.is_eligible(&bundle(-3.0), &t));
        assert!(!gate.is_eligible(&bundle(-3.5), &t));
    }

    #[test]
    fn bypass_forces_eligibility() {
        let gate = AlertGate {
            bypass_threshold: true,
        };
        assert!(gate.is_eligible(&bundle(0.4), &DropThreshold::new(3.0)));
        assert!(!gate.is_eligible(&bundle(f64::NAN), &DropThreshold::new(3.0)));
    }

    #[test]
    fn threshold_validation() {
        assert!(DropThreshold::new(2.0).is_valid());
        assert!(!DropThreshold::new(0.0).is_valid());
        assert!(!DropThreshold::new(-1.0).is_valid());
        assert!(!DropThreshold::new(3.0).with_max(2.0).is_valid());
    }

    #[test]
    fn text_block_fields() {
        let text = render_text(&alert(-3.2));
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "NVDA dropped to $96.80 (-3.20%) from $100.00");
        assert_eq!(lines[1], "RSI: 28.50 | Volume: 1.80x | Sentiment: +0.42");
        assert_eq!(lines[3], "Recommendation: Buy Opportunity");
    }

    #[test]
    fn text_block_rise_and_missing_values() {
        let mut a = alert(1.5);
        a.bundle.oscillator = None;
        a.bundle.volume_ratio = None;
        let text = render_text(&a);
        assert!(text.starts_with("NVDA rose to $101.50 (+1.50%)"));
        assert!(text.contains("RSI: n/a | Volume: n/a"));
    }

    #[test]
    fn flat_day_reads_unchanged() {
        let text = render_text(&alert(0.0));
        assert!(text.starts_with("NVDA unchanged at $100.00 (0.00%)\n"));
        assert!(!text.contains("rose"));
        // Negative zero is still flat.
        assert!(render_text(&alert(-0.0)).starts_with("NVDA unchanged at $100.00 (0.00%)"));
        assert_eq!(alert(0.0).direction(), "unchanged");
    }

    #[test]
    fn html_escapes_and_links_headlines() {
        let html = render_html(&alert(-3.2));
        assert!(html.contains("<a href=\"https://news.example/a?b=1&amp;c=2\">"));
        assert!(html.contains("Chips &amp; &lt;AI&gt; rally"));
        assert!(html.contains("<b>Recommendation:</b> Buy Opportunity"));
    }

    #[test]
    fn compose_empty_is_none() {
        assert!(compose(&[], at()).is_none());
    }

    #[test]
    fn compose_joins_blocks() {
        let mut second = alert(-5.0);
        second.bundle.symbol = "TSLA".into();
        let digest = compose(&[alert(-3.2), second], at()).unwrap();
        assert_eq!(digest.count, 2);
        assert!(digest.text.starts_with("[2024-03-15 15:45] ALERT:\nNVDA dropped"));
        assert_eq!(digest.text.matches(TEXT_SEPARATOR).count(), 1);
        assert!(digest.html.contains("NVDA dropped"));
        assert!(digest.html.contains("TSLA dropped"));
        assert!(digest.subject.contains("Stock Drop Alert (2)"));
    }
}
