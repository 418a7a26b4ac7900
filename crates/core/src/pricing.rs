// Static price table and the cost comparison behind `glm_compare_costs`

use crate::error::{GlmError, GlmResult};
use serde::Serialize;

const TOKENS_PER_MILLION: f64 = 1_000_000.0;

/// Published USD price per million tokens for one provider.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Rate {
    pub name: &'static str,
    pub input_per_million: f64,
    pub output_per_million: f64,
}

impl Rate {
    pub fn cost(&self, input_tokens: u64, output_tokens: u64) -> f64 {
        (input_tokens as f64 / TOKENS_PER_MILLION) * self.input_per_million
            + (output_tokens as f64 / TOKENS_PER_MILLION) * self.output_per_million
    }
}

/// Reference (expensive) provider versus the remote provider.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PriceTable {
    pub reference: Rate,
    pub remote: Rate,
}

pub const CLAUDE_OPUS: Rate = Rate {
    name: "Claude Opus",
    input_per_million: 15.0,
    output_per_million: 75.0,
};

pub const GLM_47: Rate = Rate {
    name: "GLM-4.7",
    input_per_million: 2.0,
    output_per_million: 8.0,
};

impl Default for PriceTable {
    fn default() -> Self {
        Self {
            reference: CLAUDE_OPUS,
            remote: GLM_47,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CostComparison {
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub reference_cost_usd: f64,
    pub remote_cost_usd: f64,
    pub savings_usd: f64,
    pub savings_percent: f64,
    pub rates: PriceTable,
}

impl PriceTable {
    /// Compare the cost of a workload under both providers.
    ///
    /// Counts arrive as signed integers straight from the host; negative
    /// values are rejected.
    pub fn compare(&self, input_tokens: i64, output_tokens: i64) -> GlmResult<CostComparison> {
        let input_tokens = non_negative("input_tokens", input_tokens)?;
        let output_tokens = non_negative("output_tokens", output_tokens)?;

        let reference_cost_usd = self.reference.cost(input_tokens, output_tokens);
        let remote_cost_usd = self.remote.cost(input_tokens, output_tokens);
        let savings_usd = reference_cost_usd - remote_cost_usd;
        let savings_percent = if reference_cost_usd > 0.0 {
            savings_usd / reference_cost_usd * 100.0
        } else {
            0.0
        };

        Ok(CostComparison {
            input_tokens,
            output_tokens,
            reference_cost_usd,
            remote_cost_usd,
            savings_usd,
            savings_percent,
            rates: *self,
        })
    }

    /// Blended per-million savings, as quoted in the status report.
    pub fn headline_savings_percent(&self) -> f64 {
        let reference = self.reference.input_per_million;
        (reference - self.remote.input_per_million) / reference * 100.0
    }
}

fn non_negative(field: &str, value: i64) -> GlmResult<u64> {
    u64::try_from(value)
        .map_err(|_| GlmError::validation(field, format!("must be non-negative, got {}", value)))
}

impl CostComparison {
    pub fn render(&self) -> String {
        format!(
            "Cost comparison\n\
             Tokens: {} input, {} output\n\
             {:<12} ${:.4}\n\
             {:<12} ${:.4}\n\
             Savings:     ${:.4} ({:.2}%)",
            group_thousands(self.input_tokens),
            group_thousands(self.output_tokens),
            format!("{}:", self.rates.reference.name),
            self.reference_cost_usd,
            format!("{}:", self.rates.remote.name),
            self.remote_cost_usd,
            self.savings_usd,
            self.savings_percent,
        )
    }
}

fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_reference_workload() {
        let cmp = PriceTable::default().compare(50_000, 20_000).unwrap();

        assert!(approx(cmp.reference_cost_usd, 2.25));
        assert!(approx(cmp.remote_cost_usd, 0.26));
        assert!(approx(cmp.savings_usd, 1.99));
        assert!(approx(cmp.savings_percent, 1.99 / 2.25 * 100.0));
        assert_eq!(format!("{:.2}", cmp.savings_percent), "88.44");
    }

    #[test]
    fn test_zero_tokens_has_zero_savings() {
        let cmp = PriceTable::default().compare(0, 0).unwrap();
        assert_eq!(cmp.reference_cost_usd, 0.0);
        assert_eq!(cmp.savings_percent, 0.0);
    }

    #[test]
    fn test_negative_counts_rejected() {
        let err = PriceTable::default().compare(-1, 10).unwrap_err();
        assert!(matches!(err, GlmError::Validation { ref field, .. } if field == "input_tokens"));

        let err = PriceTable::default().compare(10, -5).unwrap_err();
        assert!(matches!(err, GlmError::Validation { ref field, .. } if field == "output_tokens"));
    }

    #[test]
    fn test_render() {
        let text = PriceTable::default().compare(50_000, 20_000).unwrap().render();
        assert!(text.contains("Tokens: 50,000 input, 20,000 output"));
        assert!(text.contains("$2.2500"));
        assert!(text.contains("$0.2600"));
        assert!(text.contains("(88.44%)"));
    }

    #[test]
    fn test_group_thousands() {
        assert_eq!(group_thousands(0), "0");
        assert_eq!(group_thousands(999), "999");
        assert_eq!(group_thousands(1000), "1,000");
        assert_eq!(group_thousands(1234567), "1,234,567");
    }

    #[test]
    fn test_headline_savings() {
        let pct = PriceTable::default().headline_savings_percent();
        assert_eq!(format!("{:.0}", pct), "87");
    }
}
