use anyhow::{Context, Result};
use clap::Parser;
use futures::stream::{self, StreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use rand::seq::SliceRandom;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

/// Hammers the vote-casting path: registers N voters, has each of them vote
/// for a random candidate, then re-submits every ballot to confirm the
/// duplicate is rejected. Finishes by printing the election tally.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Target URL (e.g., http://localhost:8000)
    #[arg(short, long, default_value = "http://localhost:8000")]
    url: String,

    /// Election to vote in
    #[arg(short, long)]
    election: String,

    /// Number of voters to simulate
    #[arg(short = 'n', long, default_value_t = 100)]
    voters: usize,

    /// Number of concurrent requests
    #[arg(short, long, default_value_t = 10)]
    concurrency: usize,
}

#[derive(Deserialize, Debug)]
struct Candidate {
    id: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RegisterRequest {
    name: String,
    email: String,
    pin: String,
}

#[derive(Deserialize)]
struct AuthResponse {
    token: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CastVoteRequest {
    election_id: String,
    candidate_id: String,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct TallyRow {
    candidate_id: String,
    votes: i64,
    percentage: f64,
}

struct Counters {
    registered: AtomicUsize,
    voted: AtomicUsize,
    duplicates_rejected: AtomicUsize,
    errors: AtomicUsize,
}

async fn run_voter(
    client: &Client,
    base: &str,
    election: &str,
    candidates: &[Candidate],
    counters: &Counters,
    index: usize,
) -> Result<()> {
    let register = RegisterRequest {
        name: format!("Load Voter {}", index),
        email: format!("load-voter-{}-{}@example.com", index, rand::random::<u32>()),
        pin: "1234".to_string(),
    };

    let auth: AuthResponse = client
        .post(format!("{}/api/auth/register", base))
        .json(&register)
        .send()
        .await?
        .error_for_status()
        .context("registration failed")?
        .json()
        .await?;
    counters.registered.fetch_add(1, Ordering::Relaxed);

    let candidate = candidates
        .choose(&mut rand::thread_rng())
        .context("no candidates to vote for")?;
    let ballot = CastVoteRequest {
        election_id: election.to_string(),
        candidate_id: candidate.id.clone(),
    };

    let first = client
        .post(format!("{}/api/votes", base))
        .bearer_auth(&auth.token)
        .json(&ballot)
        .send()
        .await?;
    if first.status() != reqwest::StatusCode::CREATED {
        anyhow::bail!("vote rejected with status {}", first.status());
    }
    counters.voted.fetch_add(1, Ordering::Relaxed);

    // Same voter, same election: the unique constraint must reject this one.
    let second = client
        .post(format!("{}/api/votes", base))
        .bearer_auth(&auth.token)
        .json(&ballot)
        .send()
        .await?;
    if second.status() == reqwest::StatusCode::BAD_REQUEST {
        counters.duplicates_rejected.fetch_add(1, Ordering::Relaxed);
    } else {
        anyhow::bail!("duplicate vote not rejected, got {}", second.status());
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let client = Client::new();
    let base = args.url.trim_end_matches('/').to_string();

    let candidates: Vec<Candidate> = client
        .get(format!("{}/api/candidates?electionId={}", base, args.election))
        .send()
        .await?
        .error_for_status()
        .context("failed to load candidates")?
        .json()
        .await?;
    anyhow::ensure!(
        !candidates.is_empty(),
        "election {} has no candidates",
        args.election
    );
    println!(
        "Voting for {} candidates in election {}",
        candidates.len(),
        args.election
    );

    let counters = Arc::new(Counters {
        registered: AtomicUsize::new(0),
        voted: AtomicUsize::new(0),
        duplicates_rejected: AtomicUsize::new(0),
        errors: AtomicUsize::new(0),
    });

    let bar = ProgressBar::new(args.voters as u64);
    bar.set_style(
        ProgressStyle::with_template("{bar:40.cyan/blue} {pos}/{len} [{elapsed_precise}]")
            .expect("valid progress template"),
    );

    let started = Instant::now();

    stream::iter(0..args.voters)
        .map(|index| {
            let client = &client;
            let base = &base;
            let election = &args.election;
            let candidates = &candidates;
            let counters = Arc::clone(&counters);
            let bar = bar.clone();
            async move {
                if let Err(e) = run_voter(client, base, election, candidates, &counters, index).await
                {
                    counters.errors.fetch_add(1, Ordering::Relaxed);
                    bar.println(format!("voter {}: {:#}", index, e));
                }
                bar.inc(1);
            }
        })
        .buffer_unordered(args.concurrency)
        .collect::<Vec<_>>()
        .await;

    bar.finish();

    let elapsed = started.elapsed();
    println!(
        "\n{} registered, {} voted, {} duplicates rejected, {} errors in {:.2?}",
        counters.registered.load(Ordering::Relaxed),
        counters.voted.load(Ordering::Relaxed),
        counters.duplicates_rejected.load(Ordering::Relaxed),
        counters.errors.load(Ordering::Relaxed),
        elapsed,
    );

    let tally: Vec<TallyRow> = client
        .get(format!("{}/api/elections/{}/stats", base, args.election))
        .send()
        .await?
        .error_for_status()
        .context("failed to load tally")?
        .json()
        .await?;

    println!("\nTally:");
    let mut total = 0;
    for row in &tally {
        println!(
            "  {:<20} {:>6} votes  {:>6.2}%",
            row.candidate_id, row.votes, row.percentage
        );
        total += row.votes;
    }
    println!("  total displayed votes: {}", total);

    Ok(())
}
