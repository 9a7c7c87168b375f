//! Styled output formatting for subscan using anstyle.
//!
//! Renders a scan as a short terminal report: the subdomain list followed
//! by one line per provider. Colors are only emitted when stdout is a
//! terminal and `NO_COLOR` is unset.

use anstyle::{AnsiColor, Color, Style};
use std::fmt::Write;
use std::io::{self, IsTerminal, Write as IoWrite};
use std::time::Duration;

use crate::merge::{ProviderStatus, ScanResult};

const RULE: &str = "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━";

/// Style definitions for different UI elements
pub struct Styles {
    pub header: Style,
    pub success: Style,
    pub warning: Style,
    pub error: Style,
    pub info: Style,
    pub muted: Style,
    pub bold: Style,
    pub host: Style,
}

impl Default for Styles {
    fn default() -> Self {
        Self {
            header: Style::new()
                .bold()
                .fg_color(Some(Color::Ansi(AnsiColor::Blue))),
            success: Style::new()
                .bold()
                .fg_color(Some(Color::Ansi(AnsiColor::Green))),
            warning: Style::new()
                .bold()
                .fg_color(Some(Color::Ansi(AnsiColor::Yellow))),
            error: Style::new()
                .bold()
                .fg_color(Some(Color::Ansi(AnsiColor::Red))),
            info: Style::new().fg_color(Some(Color::Ansi(AnsiColor::Blue))),
            muted: Style::new().fg_color(Some(Color::Ansi(AnsiColor::BrightBlack))),
            bold: Style::new().bold(),
            host: Style::new().fg_color(Some(Color::Ansi(AnsiColor::Green))),
        }
    }
}

/// Styled output formatter for scan results
pub struct StyledFormatter {
    styles: Styles,
    use_colors: bool,
}

impl StyledFormatter {
    /// Create a new styled formatter
    pub fn new() -> Self {
        Self {
            styles: Styles::default(),
            use_colors: Self::should_use_colors(),
        }
    }

    /// Create a formatter without colors (for non-interactive use)
    pub fn without_colors() -> Self {
        Self {
            styles: Styles::default(),
            use_colors: false,
        }
    }

    /// Determine if colors should be used based on environment
    fn should_use_colors() -> bool {
        io::stdout().is_terminal() && std::env::var_os("NO_COLOR").is_none()
    }

    /// Apply style to text if colors are enabled
    fn styled(&self, text: &str, style: &Style) -> String {
        if self.use_colors {
            format!("{}{}{}", style.render(), text, style.render_reset())
        } else {
            text.to_string()
        }
    }

    /// Format a finished scan of `domain`
    pub fn format_scan(
        &self,
        domain: &str,
        result: &ScanResult,
        elapsed: Duration,
    ) -> Result<String, std::fmt::Error> {
        let mut output = String::new();
        self.write_header(&mut output, domain, result)?;
        self.write_records(&mut output, result)?;
        self.write_footer(&mut output, result, elapsed)?;
        Ok(output)
    }

    fn write_header(
        &self,
        output: &mut String,
        domain: &str,
        result: &ScanResult,
    ) -> Result<(), std::fmt::Error> {
        writeln!(output)?;
        writeln!(output, "{}", self.styled(RULE, &self.styles.muted))?;
        writeln!(
            output,
            "  {}",
            self.styled(&format!("Subdomains of {domain}"), &self.styles.header)
        )?;
        writeln!(
            output,
            "  {} unique host(s) from {} of {} provider(s)",
            self.styled(&result.count.to_string(), &self.styles.bold),
            result.succeeded(),
            result.providers.len()
        )?;
        writeln!(output, "{}", self.styled(RULE, &self.styles.muted))?;
        Ok(())
    }

    fn write_records(&self, output: &mut String, result: &ScanResult) -> Result<(), std::fmt::Error> {
        if result.is_empty() {
            writeln!(
                output,
                "  {}",
                self.styled("No subdomains found", &self.styles.warning)
            )?;
            writeln!(
                output,
                "  {}",
                self.styled(
                    "The providers answered but knew no hosts below this domain.",
                    &self.styles.muted
                )
            )?;
            return Ok(());
        }

        let last = result.records.len() - 1;
        for (i, record) in result.records.iter().enumerate() {
            let branch = if i == last { "└─" } else { "├─" };
            writeln!(
                output,
                "  {} {}",
                self.styled(branch, &self.styles.muted),
                self.styled(record.as_str(), &self.styles.host)
            )?;
        }
        Ok(())
    }

    fn write_footer(
        &self,
        output: &mut String,
        result: &ScanResult,
        elapsed: Duration,
    ) -> Result<(), std::fmt::Error> {
        writeln!(output)?;
        writeln!(output, "  {}", self.styled("Providers:", &self.styles.info))?;

        for stats in &result.providers {
            match stats.status {
                ProviderStatus::Success => writeln!(
                    output,
                    "    {} {:<14} {} host(s) in {}ms",
                    self.styled("✓", &self.styles.success),
                    stats.name,
                    stats.raw_count,
                    stats.elapsed_ms
                )?,
                ProviderStatus::Failed => {
                    let reason = result
                        .failed_providers
                        .iter()
                        .find(|f| f.provider == stats.name)
                        .map(|f| f.failure.to_string())
                        .unwrap_or_else(|| "failed".to_string());
                    writeln!(
                        output,
                        "    {} {:<14} {}",
                        self.styled("✗", &self.styles.error),
                        stats.name,
                        self.styled(&reason, &self.styles.warning)
                    )?
                }
            }
        }

        writeln!(output)?;
        writeln!(
            output,
            "  {} Total time: {}ms",
            self.styled("└─", &self.styles.muted),
            self.styled(&elapsed.as_millis().to_string(), &self.styles.bold)
        )?;
        writeln!(output, "{}", self.styled(RULE, &self.styles.muted))?;
        Ok(())
    }

    /// Print a finished scan to stdout
    pub fn print_scan(&self, domain: &str, result: &ScanResult, elapsed: Duration) -> io::Result<()> {
        let formatted = self
            .format_scan(domain, result, elapsed)
            .map_err(|e| io::Error::other(format!("{}", e)))?;
        print!("{}", formatted);
        io::stdout().flush()?;
        Ok(())
    }
}

impl Default for StyledFormatter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ProviderFailure;
    use crate::merge::merge;
    use crate::providers::ProviderResult;
    use crate::scheduler::ProviderReport;

    fn create_test_result(hosts: &[&str]) -> ScanResult {
        merge(&[
            ProviderReport::new(
                "crtsh",
                ProviderResult::Success(hosts.iter().map(|h| h.to_string()).collect()),
                Duration::from_millis(250),
            ),
            ProviderReport::new(
                "urlscan",
                ProviderResult::Failure(ProviderFailure::rate_limited("HTTP 429")),
                Duration::from_millis(40),
            ),
        ])
    }

    #[test]
    fn test_styled_formatter_creation() {
        let formatter = StyledFormatter::new();
        assert!(!formatter.use_colors || io::stdout().is_terminal());
    }

    #[test]
    fn test_results_formatting() {
        let formatter = StyledFormatter::without_colors();
        let result = create_test_result(&["www.example.com", "mail.example.com"]);

        let output = formatter
            .format_scan("example.com", &result, Duration::from_millis(251))
            .unwrap();

        assert!(output.contains("Subdomains of example.com"));
        assert!(output.contains("├─ mail.example.com"));
        assert!(output.contains("└─ www.example.com"));
        assert!(output.contains("crtsh"));
        assert!(output.contains("rate limited: HTTP 429"));
        assert!(output.contains("251ms"));
        assert!(!output.contains('\u{1b}'));
    }

    #[test]
    fn test_empty_result_message() {
        let formatter = StyledFormatter::without_colors();
        let output = formatter
            .format_scan("example.com", &create_test_result(&[]), Duration::ZERO)
            .unwrap();
        assert!(output.contains("No subdomains found"));
    }
}
