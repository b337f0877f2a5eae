use anyhow::{Context, Result};
use clap::{Args, Subcommand};

use foundry_advisor::artifact::runway::{self, DEFAULT_MONTHS};
use foundry_advisor::artifact::{PitchExtras, VentureBrief};
use foundry_advisor::{RunwayInputs, ToolRequest};
use foundry_core::config::FoundryConfig;

use crate::bootstrap;
use crate::output::OutputFormat;

#[derive(Args)]
pub struct ToolArgs {
    #[command(subcommand)]
    pub tool: Tool,
}

#[derive(Subcommand)]
pub enum Tool {
    /// Runway and burn-rate analysis
    BurnRate {
        /// Available capital
        #[arg(long)]
        capital: f64,
        /// Monthly operating expenses
        #[arg(long)]
        monthly_expenses: f64,
    },
    /// Nine-block business model canvas
    Canvas(BriefArgs),
    /// Cash projection with revenue, expense split and risk zone (no model call)
    Runway {
        /// Cash on hand
        #[arg(long)]
        cash: f64,
        /// Monthly operating expenses
        #[arg(long)]
        monthly_expenses: f64,
        /// Monthly revenue
        #[arg(long, default_value_t = 0.0)]
        monthly_revenue: f64,
        /// Months to project
        #[arg(long, default_value_t = DEFAULT_MONTHS)]
        months: u32,
    },
    /// Nine-slide investor pitch deck
    PitchDeck {
        #[command(flatten)]
        brief: BriefArgs,
        #[arg(long)]
        business_model: Option<String>,
        #[arg(long)]
        market_size: Option<String>,
        #[arg(long)]
        funding_needed: Option<String>,
    },
}

#[derive(Args)]
pub struct BriefArgs {
    /// Problem the venture solves
    #[arg(long)]
    pub problem: String,
    /// How it solves it
    #[arg(long)]
    pub solution: String,
    /// Who it is for
    #[arg(long)]
    pub target_group: String,
}

impl BriefArgs {
    fn to_brief(&self) -> Result<VentureBrief> {
        Ok(VentureBrief::new(
            self.problem.as_str(),
            self.solution.as_str(),
            self.target_group.as_str(),
        )?)
    }
}

fn request(tool: &Tool) -> Result<ToolRequest> {
    let request = match tool {
        Tool::Runway { .. } => anyhow::bail!("runway projections do not use the model"),
        Tool::BurnRate {
            capital,
            monthly_expenses,
        } => ToolRequest::burn_rate(*capital, *monthly_expenses)?,
        Tool::Canvas(brief) => ToolRequest::canvas(brief.to_brief()?),
        Tool::PitchDeck {
            brief,
            business_model,
            market_size,
            funding_needed,
        } => ToolRequest::pitch_deck(
            brief.to_brief()?,
            PitchExtras::new(
                business_model.clone(),
                market_size.clone(),
                funding_needed.clone(),
            ),
        ),
    };
    Ok(request)
}

fn run_runway(inputs: RunwayInputs, format: OutputFormat) -> Result<()> {
    let report = runway::project_today(&inputs);
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Text | OutputFormat::Markdown => println!("{}", report.to_markdown()),
    }
    Ok(())
}

pub fn run(args: &ToolArgs, config: &FoundryConfig, format: OutputFormat) -> Result<()> {
    if let Tool::Runway {
        cash,
        monthly_expenses,
        monthly_revenue,
        months,
    } = &args.tool
    {
        let inputs = RunwayInputs::new(*cash, *monthly_expenses, *monthly_revenue)
            .and_then(|inputs| inputs.with_months(*months))
            .context("Invalid tool input")?;
        return run_runway(inputs, format);
    }

    let request = request(&args.tool).context("Invalid tool input")?;

    let generator = bootstrap::generator(config)?;
    let rt = bootstrap::runtime()?;
    let artifact = rt.block_on(async {
        let options = bootstrap::interruptible(config);
        generator.generate(&request, &options).await
    });
    let artifact = artifact.with_context(|| format!("Failed to generate {}", request.kind()))?;

    if artifact.is_fallback() {
        tracing::warn!(kind = %artifact.kind, "Model output was unusable, showing computed fallback");
    }

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&artifact)?),
        OutputFormat::Text | OutputFormat::Markdown => println!("{}", artifact.to_markdown()),
    }
    Ok(())
}
