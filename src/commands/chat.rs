// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::{ranged, Ctx};
use crate::advisor::{advice_prompt, advisor_for, Advisor, ChatMessage, GREETING};
use crate::book::Book;
use crate::kpi::{calculate_kpis, top_costs};
use crate::models::Transaction;
use anyhow::Result;
use std::io::{self, BufRead, Write};
use tracing::warn;

pub fn handle(ctx: &Ctx, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("advice", sub)) => advice(ctx, sub)?,
        Some(("chat", sub)) => chat(ctx, sub)?,
        _ => {}
    }
    Ok(())
}

fn build(ctx: &Ctx, book: &Book, txs: &[Transaction]) -> Result<Box<dyn Advisor>> {
    let kpis = calculate_kpis(txs);
    Ok(advisor_for(
        ctx.config.gemini_api_key.clone(),
        &kpis,
        txs,
        &book.budgets,
    )?)
}

fn advice(ctx: &Ctx, sub: &clap::ArgMatches) -> Result<()> {
    let (book, txs) = ranged(ctx, sub)?;
    let prompt = advice_prompt(&calculate_kpis(&txs), &top_costs(&txs, 3));
    let advisor = build(ctx, &book, &txs)?;
    match advisor.advise(&prompt) {
        Ok(text) => println!("{}", text),
        Err(err) => {
            warn!(error = %err, "advice request failed");
            println!("Si è verificato un errore durante l'analisi dei dati.");
        }
    }
    Ok(())
}

/// One exchange; failures become a model message so the session continues.
pub fn turn(advisor: &dyn Advisor, history: &mut Vec<ChatMessage>, message: &str) -> String {
    let answer = match advisor.reply(history, message) {
        Ok(text) => text,
        Err(err) => {
            warn!(advisor = advisor.name(), error = %err, "chat turn failed");
            "Si è verificato un errore durante la comunicazione con l'AI.".to_string()
        }
    };
    history.push(ChatMessage::user(message));
    history.push(ChatMessage::model(answer.clone()));
    answer
}

fn chat(ctx: &Ctx, sub: &clap::ArgMatches) -> Result<()> {
    let (book, txs) = ranged(ctx, sub)?;
    let advisor = build(ctx, &book, &txs)?;
    let mut history = vec![ChatMessage::model(GREETING)];

    if let Some(msg) = sub.get_one::<String>("message") {
        println!("{}", turn(advisor.as_ref(), &mut history, msg));
        return Ok(());
    }

    println!("{}", GREETING);
    let stdin = io::stdin();
    loop {
        print!("> ");
        io::stdout().flush()?;
        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if matches!(line, "exit" | "quit" | "esci") {
            break;
        }
        println!("{}\n", turn(advisor.as_ref(), &mut history, line));
    }
    Ok(())
}
