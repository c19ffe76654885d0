mod api;
mod export;
mod model;
mod render;

use std::path::PathBuf;

use anyhow::Context;
use chrono::{NaiveDate, NaiveTime, TimeZone, Utc};
use clap::{Parser, Subcommand};
use dotenvy::dotenv;
use tracing_subscriber::EnvFilter;

use crate::{
    api::ApiClient,
    model::{CreateReview, RatingInput, ReviewFilter},
};

#[derive(Parser, Debug)]
#[command(name = "review-client", version, about = "Review analytics terminal client")]
struct Cli {
    /// Base URL of the review server
    #[arg(long, env = "REVIEW_API_URL", default_value = "http://127.0.0.1:8080", global = true)]
    api_url: String,
    /// Bearer token printed by `login`
    #[arg(long, env = "REVIEW_API_TOKEN", hide_env_values = true, global = true)]
    token: Option<String>,
    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Sign in and print a token
    Login {
        #[arg(long)]
        email: String,
        #[arg(long, env = "REVIEW_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Create an analyst account
    Register {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long, env = "REVIEW_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Show the signed-in account
    Whoami,
    /// KPIs, top and bottom products, rollups and the monthly trend
    Dashboard {
        #[arg(long, default_value_t = 5)]
        top: u64,
        #[arg(long)]
        category: Option<i32>,
    },
    /// List products
    Products {
        #[arg(long)]
        category: Option<i32>,
        #[arg(long)]
        q: Option<String>,
    },
    /// Page through reviews, newest first
    Reviews {
        #[arg(long)]
        product: Option<i32>,
        #[arg(long)]
        category: Option<i32>,
        /// ACTIVE or REJECTED
        #[arg(long)]
        status: Option<String>,
        #[arg(long)]
        from: Option<NaiveDate>,
        #[arg(long)]
        to: Option<NaiveDate>,
        #[arg(long, default_value_t = 1)]
        page: u64,
        #[arg(long)]
        size: Option<u64>,
    },
    /// Submit a review, e.g. `rate --product 3 --rating 1=5 --rating 2=4`
    Rate {
        #[arg(long)]
        product: i32,
        /// CRITERION_ID=RATING, repeatable
        #[arg(long = "rating", value_parser = parse_rating, required = true)]
        ratings: Vec<RatingInput>,
        /// Review date, defaults to now
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Write the dashboard report as CSV
    Export {
        #[arg(long)]
        out: PathBuf,
        #[arg(long, default_value_t = 5)]
        top: u64,
        #[arg(long)]
        category: Option<i32>,
    },
}

fn parse_rating(raw: &str) -> Result<RatingInput, String> {
    let (criterion, rating) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected CRITERION_ID=RATING, got `{}`", raw))?;
    let criterion_id = criterion
        .trim()
        .parse()
        .map_err(|_| format!("invalid criterion id `{}`", criterion))?;
    let rating = rating
        .trim()
        .parse()
        .map_err(|_| format!("invalid rating `{}`", rating))?;
    if !(1..=5).contains(&rating) {
        return Err(format!("rating must be between 1 and 5, got {}", rating));
    }
    Ok(RatingInput {
        criterion_id,
        rating,
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let client = ApiClient::new(&cli.api_url, cli.token)?;

    match cli.cmd {
        Cmd::Login { email, password } => {
            let auth = client.login(&email, &password).await?;
            eprintln!(
                "signed in as {} <{}> [{}]",
                auth.user.name,
                auth.user.email,
                auth.user.roles.join(", ")
            );
            println!("export REVIEW_API_TOKEN={}", auth.token);
        }
        Cmd::Register {
            name,
            email,
            password,
        } => {
            let auth = client.register(&name, &email, &password).await?;
            eprintln!("registered {} (id {})", auth.user.email, auth.user.id);
            println!("export REVIEW_API_TOKEN={}", auth.token);
        }
        Cmd::Whoami => {
            let user = client.me().await?;
            println!(
                "{} <{}> [{}]{}",
                user.name,
                user.email,
                user.roles.join(", "),
                if user.active { "" } else { " (disabled)" }
            );
        }
        Cmd::Dashboard { top, category } => {
            let dashboard = client.dashboard(top, category).await?;
            println!("{}", render::render_dashboard(&dashboard));
        }
        Cmd::Products { category, q } => {
            let products = client.products(category, q.as_deref()).await?;
            println!("{}", render::render_products(&products));
        }
        Cmd::Reviews {
            product,
            category,
            status,
            from,
            to,
            page,
            size,
        } => {
            let filter = ReviewFilter {
                product_id: product,
                category_id: category,
                status: status.map(|s| s.to_uppercase()),
                from,
                to,
                page: Some(page),
                size,
            };
            let page = client.reviews(&filter).await?;
            println!("{}", render::render_reviews(&page));
        }
        Cmd::Rate {
            product,
            ratings,
            date,
        } => {
            let date_created = date.map(|d| Utc.from_utc_datetime(&d.and_time(NaiveTime::MIN)));
            let review = client
                .create_review(&CreateReview {
                    product_id: product,
                    date_created,
                    ratings,
                })
                .await?;
            println!(
                "review {} for {} saved, integral rating {}",
                review.id,
                review.product_name,
                render::fmt_rating(review.integral_rating)
            );
        }
        Cmd::Export { out, top, category } => {
            let dashboard = client.dashboard(top, category).await?;
            let rows = export::export_dashboard(&out, &dashboard)
                .with_context(|| format!("export to {} failed", out.display()))?;
            println!("wrote {} rows to {}", rows, out.display());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn rating_argument_parses() {
        assert_eq!(
            parse_rating("3=4").unwrap(),
            RatingInput {
                criterion_id: 3,
                rating: 4
            }
        );
        assert_eq!(parse_rating(" 7 = 5 ").unwrap().criterion_id, 7);
        assert!(parse_rating("3").is_err());
        assert!(parse_rating("x=4").is_err());
        assert!(parse_rating("3=9").is_err());
    }

    #[test]
    fn rate_requires_at_least_one_rating() {
        let parsed = Cli::try_parse_from(["review-client", "rate", "--product", "1"]);
        assert!(parsed.is_err());
        let parsed = Cli::try_parse_from([
            "review-client",
            "rate",
            "--product",
            "1",
            "--rating",
            "2=5",
        ])
        .unwrap();
        assert!(matches!(parsed.cmd, Cmd::Rate { ref ratings, .. } if ratings.len() == 1));
    }
}
