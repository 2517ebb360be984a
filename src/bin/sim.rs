use broadside::sim::{run_local_match, BotReport};
use broadside::{env_level, init_logging};
use serde_json::json;

fn parse_seed(arg: Option<String>, name: &str) -> anyhow::Result<u64> {
    let arg = arg.ok_or_else(|| anyhow::anyhow!("missing {}", name))?;
    arg.parse()
        .map_err(|e| anyhow::anyhow!("bad {} `{}`: {}", name, arg, e))
}

fn summary(bot: &BotReport) -> serde_json::Value {
    json!({
        "identity": bot.identity,
        "slot": bot.slot,
        "shots": bot.shots,
        "hits": bot.hits,
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let mut args = std::env::args().skip(1);
    let (seed1, seed2) = match (args.next(), args.next(), args.next()) {
        (a, b, None) if a.is_some() && b.is_some() => {
            (parse_seed(a, "seed1")?, parse_seed(b, "seed2")?)
        }
        _ => {
            eprintln!("Usage: sim <seed1> <seed2>");
            std::process::exit(1);
        }
    };
    // Logging is opt-in here.
    if std::env::var_os("BROADSIDE_LOG").is_some() {
        init_logging(Some(env_level()));
    }

    let report = run_local_match(seed1, seed2).await?;
    let winner = [&report.player1, &report.player2]
        .into_iter()
        .find(|bot| report.winner.is_some() && bot.slot == report.winner)
        .map(|bot| bot.identity.clone());

    let result = json!({
        "player1": summary(&report.player1),
        "player2": summary(&report.player2),
        "winner": winner,
        "winningSlot": report.winner,
    });
    println!("{}", serde_json::to_string(&result)?);
    Ok(())
}
