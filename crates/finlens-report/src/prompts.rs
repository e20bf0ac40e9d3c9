//! Prompt templates for the extraction and market analysis calls

use finlens_prompt::{JinjaTemplate, PromptRegistry, Result};

/// Registry key of the extraction prompt
pub const EXTRACTION: &str = "finlens.extraction";

/// Registry key of the market analysis prompt
pub const MARKET_ANALYSIS: &str = "finlens.market_analysis";

/// Create the extraction prompt template
///
/// Sent alongside the PDF; takes no variables.
pub fn extraction_prompt() -> Result<JinjaTemplate> {
    JinjaTemplate::new(
        EXTRACTION,
        r#"You are a financial data extraction assistant.
Read the attached company financial report (PDF) and extract the following values in pure numeric form.

First, identify the company name from the document itself (usually found in the header, title, or footer).

Always return numbers only (no currency symbols, commas, text, or words like 'million' or 'approximately').
If a number cannot be found, write 0.

Extract:
1. Company Name (from the document)
2. Net Worth (total assets minus total liabilities)
3. Total Liabilities (what the company owes)
4. Total Equity (owner/shareholders' ownership value)
5. Statement of Profit or Loss:
   a. Total Revenue
   b. Total Expenses
   c. Net Profit or Loss

Formatting rules:
- The company name must come from the PDF document itself
- All numeric values must be numbers only
- Do not include symbols, commas, text, or units in numeric fields
- If a number is unavailable, use 0
- Return only JSON, no explanation

Output format:
{
  "company": "<company name from the document>",
  "net_worth": <number>,
  "liabilities": <number>,
  "equity": <number>,
  "profit_and_loss": {
    "total_revenue": <number>,
    "total_expenses": <number>,
    "net_profit_or_loss": <number>
  }
}"#,
    )
}

/// Create the market analysis prompt template
///
/// Variables: `ratios` (a serialized ratio record).
pub fn market_analysis_prompt() -> Result<JinjaTemplate> {
    JinjaTemplate::new(
        MARKET_ANALYSIS,
        r#"You are a financial analyst expert. Analyze the following company's financial ratios and provide a comprehensive market comparison using the latest available market data.

Company: {{ ratios.company }}

Financial Ratios:
- Net Profit Margin: {{ ratios.net_profit_margin_percent }}%
- Return on Equity (ROE): {{ ratios.return_on_equity_percent }}%
- Return on Assets (ROA): {{ ratios.return_on_assets_percent }}%
- Current Ratio: {{ ratios.current_ratio }}
- Debt-to-Equity Ratio: {{ ratios.debt_to_equity_ratio }}
- Asset Turnover: {{ ratios.asset_turnover_ratio }}

Financial Data:
- Total Assets: ${{ ratios.total_assets | thousands }}
- Total Revenue: ${{ ratios.total_revenue | thousands }}
- Net Profit: ${{ ratios.net_profit | thousands }}

IMPORTANT: Search online for current industry benchmarks and competitor data for {{ ratios.company }}'s sector.
Look for:
1. Current industry average profit margins for this company's sector
2. Typical ROE and ROA ranges for similar companies
3. Standard liquidity and leverage ratios in this industry
4. Recent market trends and sector performance
5. Competitor financial metrics if available

Provide your analysis in the following JSON format:
{
  "company": "{{ ratios.company }}",
  "overall_health_score": <0-100 score>,
  "performance_grade": "<A+, A, B+, B, C+, C, D, F>",
  "industry_comparison": {
    "profitability": "<Above Market/At Market/Below Market>",
    "liquidity": "<Strong/Adequate/Weak>",
    "leverage": "<Conservative/Moderate/Aggressive>",
    "efficiency": "<High/Moderate/Low>"
  },
  "key_strengths": ["<strength 1>", "<strength 2>", "<strength 3>"],
  "key_weaknesses": ["<weakness 1>", "<weakness 2>", "<weakness 3>"],
  "market_position": "<Brief summary of market position based on searched data>",
  "investment_outlook": "<Positive/Neutral/Negative>",
  "recommendations": ["<recommendation 1>", "<recommendation 2>", "<recommendation 3>"],
  "detailed_analysis": {
    "profitability_analysis": "<Analysis paragraph with specific industry comparisons>",
    "liquidity_analysis": "<Analysis paragraph with market context>",
    "leverage_analysis": "<Analysis paragraph with sector norms>",
    "efficiency_analysis": "<Analysis paragraph with peer comparisons>"
  },
  "benchmarks_used": {
    "net_profit_margin_industry_avg": <number>,
    "roe_industry_avg": <number>,
    "roa_industry_avg": <number>,
    "current_ratio_healthy_range": "<range from industry data>",
    "debt_to_equity_healthy_range": "<range from industry data>",
    "data_sources": ["<source 1>", "<source 2>", "<source 3>"]
  },
  "market_context": {
    "sector": "<identified sector>",
    "region": "<operating region if identifiable>",
    "competitors": ["<competitor 1>", "<competitor 2>", "<competitor 3>"],
    "industry_trends": "<brief summary of current sector trends>"
  }
}

Base your analysis on actual data from credible financial sources. If you cannot find specific data for this company's exact sector, use the closest comparable industry data and note the approximation.
Return only JSON, no explanation."#,
    )
}

/// Register all pipeline prompts with the given registry
pub fn register_prompts(registry: &PromptRegistry) -> Result<()> {
    registry.register(extraction_prompt()?);
    registry.register(market_analysis_prompt()?);
    Ok(())
}

/// A registry holding the built-in prompts
pub fn default_registry() -> Result<PromptRegistry> {
    let registry = PromptRegistry::new();
    register_prompts(&registry)?;
    Ok(registry)
}
