// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Advisory chat. The state is flattened into a prompt and handed to either a
//! canned responder or the Gemini `generateContent` endpoint; which one is
//! decided once by [`advisor_for`].

use crate::kpi::{RATE_DIVIDEND, RATE_IRAP, RATE_IRES};
use crate::models::{Category, FinancialKpis, ProjectBudget, Transaction};
use crate::utils::{fmt_money, http_client};
use crate::variance::project_stats;
use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use thiserror::Error;
use tracing::{debug, info};

pub const GEMINI_MODEL: &str = "gemini-2.5-flash";
pub const GREETING: &str = "Ciao! Sono il tuo assistente finanziario AI. Conosco tutti i dati dell'azienda. Come posso aiutarti oggi?";

#[derive(Debug, Error)]
pub enum AdvisorError {
    #[error("advisor request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("advisor returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("advisor returned no text")]
    Empty,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Model,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub text: String,
}

impl ChatMessage {
    pub fn user(text: impl Into<String>) -> Self {
        Self { role: Role::User, text: text.into() }
    }

    pub fn model(text: impl Into<String>) -> Self {
        Self { role: Role::Model, text: text.into() }
    }
}

pub trait Advisor {
    fn name(&self) -> &'static str;
    fn reply(&self, history: &[ChatMessage], message: &str) -> Result<String, AdvisorError>;

    /// Single-shot analysis of an [`advice_prompt`].
    fn advise(&self, prompt: &str) -> Result<String, AdvisorError> {
        self.reply(&[], prompt)
    }
}

/// Full state dump used as the system context of a chat.
pub fn build_context(
    kpis: &FinancialKpis,
    transactions: &[Transaction],
    budgets: &[ProjectBudget],
) -> String {
    let mut s = String::new();
    let _ = writeln!(
        s,
        "Sei il CFO virtuale di una piccola impresa edile italiana. Rispondi in italiano, in modo conciso."
    );
    let _ = writeln!(
        s,
        "Aliquote: IRES {}%, IRAP {}%, ritenuta dividendi {}%.",
        (RATE_IRES * Decimal::ONE_HUNDRED).normalize(),
        (RATE_IRAP * Decimal::ONE_HUNDRED).normalize(),
        (RATE_DIVIDEND * Decimal::ONE_HUNDRED).normalize()
    );
    let _ = writeln!(s, "\nKPI:");
    for (label, v) in kpi_lines(kpis) {
        let _ = writeln!(s, "- {}: {}", label, fmt_money(&v));
    }

    let _ = writeln!(s, "\nCantieri:");
    for p in project_stats(transactions) {
        let _ = writeln!(
            s,
            "- {}: ricavi {}, costi {}, margine {}",
            p.name,
            fmt_money(&p.revenue),
            fmt_money(&p.costs),
            fmt_money(&p.margin)
        );
    }

    if !budgets.is_empty() {
        let _ = writeln!(s, "\nBudget:");
        for b in budgets {
            let _ = writeln!(
                s,
                "- {}: ricavi previsti {}, costi previsti {}",
                b.project_name,
                fmt_money(&b.budget_revenue),
                fmt_money(&b.budget_cost)
            );
        }
    }

    let _ = writeln!(s, "\nMovimenti:");
    for t in transactions {
        let _ = writeln!(
            s,
            "- {} | {} | {} | {} | {} | {}",
            t.date,
            t.description,
            t.r#type,
            t.category,
            fmt_money(&t.amount),
            t.project.as_deref().unwrap_or("-")
        );
    }
    s
}

fn kpi_lines(k: &FinancialKpis) -> Vec<(&'static str, Decimal)> {
    vec![
        ("Fatturato", k.revenue),
        ("Costi Cantieri (COGS)", k.cogs),
        ("Margine Lordo", k.gross_margin),
        ("Spese Operative", k.opex),
        ("EBITDA (MOL)", k.ebitda),
        ("EBIT (MON)", k.ebit),
        ("Imposte IRES+IRAP", k.taxes),
        ("Utile Netto", k.net_income),
        ("Dividendi netti", k.dividends),
        ("Ritenuta dividendi", k.dividend_tax),
    ]
}

/// One-shot CFO analysis prompt.
pub fn advice_prompt(kpis: &FinancialKpis, top_costs: &[(Category, Decimal)]) -> String {
    let mut s = String::from(
        "Agisci come un CFO esperto per una piccola impresa edile italiana.\nAnalizza i seguenti dati finanziari attuali:\n\n",
    );
    for (label, v) in kpi_lines(kpis).into_iter().filter(|(l, _)| {
        !matches!(*l, "EBIT (MON)" | "Imposte IRES+IRAP" | "Dividendi netti" | "Ritenuta dividendi")
    }) {
        let _ = writeln!(s, "- {}: {}", label, fmt_money(&v));
    }
    let _ = writeln!(s, "\nLe voci di costo maggiori sono:");
    for (cat, v) in top_costs {
        let _ = writeln!(s, "- {}: {}", cat.label(), fmt_money(v));
    }
    s.push_str(
        "\nFornisci una breve analisi strategica (max 200 parole) in italiano.\n\
         1. Identifica un punto di forza.\n\
         2. Identifica un punto critico o un rischio.\n\
         3. Dai un consiglio pratico su dove investire o tagliare costi per ottimizzare l'EBITDA.\n\
         Usa un tono professionale ma diretto.\n",
    );
    s
}

static RE_TAX: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\b(tass|impost|ires|irap)").unwrap());
static RE_DIVIDEND: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\b(dividend|prelev|utile)").unwrap());
static RE_MARGIN: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\b(margin|ebitda|mol|redditiv)").unwrap());
static RE_COST: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\b(cost|spes|tagli)").unwrap());

/// Answers from the KPI snapshot without any network access.
pub struct CannedAdvisor {
    kpis: FinancialKpis,
}

impl CannedAdvisor {
    pub fn new(kpis: FinancialKpis) -> Self {
        Self { kpis }
    }
}

impl Advisor for CannedAdvisor {
    fn name(&self) -> &'static str {
        "canned"
    }

    fn advise(&self, _prompt: &str) -> Result<String, AdvisorError> {
        let k = &self.kpis;
        if k.revenue.is_zero() && k.total_costs().is_zero() {
            return Ok("Nessun movimento registrato: non ci sono dati da analizzare.".to_string());
        }
        let margin_pct = if k.revenue > Decimal::ZERO {
            k.ebitda / k.revenue * Decimal::ONE_HUNDRED
        } else {
            Decimal::ZERO
        };
        let strength = if k.ebitda > Decimal::ZERO {
            format!("1. Punto di forza: EBITDA positivo di {} ({:.1}% del fatturato).", fmt_money(&k.ebitda), margin_pct.round_dp(1))
        } else {
            format!("1. Punto di forza: fatturato di {} già acquisito.", fmt_money(&k.revenue))
        };
        let risk = if k.ebitda <= Decimal::ZERO {
            format!("2. Rischio: la gestione operativa è in perdita ({}).", fmt_money(&k.ebitda))
        } else if k.cogs > k.opex {
            format!("2. Rischio: i costi diretti di cantiere ({}) assorbono gran parte del margine.", fmt_money(&k.cogs))
        } else {
            format!("2. Rischio: le spese operative ({}) superano i costi diretti.", fmt_money(&k.opex))
        };
        let tip = if k.cogs > k.opex {
            "3. Consiglio: rinegozia i prezzi con i fornitori di cantiere e verifica gli scostamenti dai preventivi."
        } else {
            "3. Consiglio: riduci le spese fisse e di marketing non legate a commesse attive."
        };
        Ok(format!("{}\n{}\n{}\n(Analisi demo: nessuna API key configurata.)", strength, risk, tip))
    }

    fn reply(&self, _history: &[ChatMessage], message: &str) -> Result<String, AdvisorError> {
        let k = &self.kpis;
        let text = if RE_TAX.is_match(message) {
            format!(
                "Le imposte stimate (IRES + IRAP) ammontano a {}. Con la ritenuta sui dividendi il carico fiscale totale è {}.",
                fmt_money(&k.taxes),
                fmt_money(&k.total_tax_burden())
            )
        } else if RE_DIVIDEND.is_match(message) {
            format!(
                "L'utile netto stimato è {}. Distribuendolo interamente i soci incasserebbero {} netti dopo una ritenuta di {}.",
                fmt_money(&k.net_income),
                fmt_money(&k.dividends),
                fmt_money(&k.dividend_tax)
            )
        } else if RE_MARGIN.is_match(message) {
            format!(
                "Il margine lordo è {} e l'EBITDA è {} su un fatturato di {}.",
                fmt_money(&k.gross_margin),
                fmt_money(&k.ebitda),
                fmt_money(&k.revenue)
            )
        } else if RE_COST.is_match(message) {
            format!(
                "I costi diretti di cantiere sono {}, le spese operative {}. Intervenire sulle spese operative migliora direttamente l'EBITDA.",
                fmt_money(&k.cogs),
                fmt_money(&k.opex)
            )
        } else {
            "Modalità demo: nessuna API key configurata. Posso comunque risponderti su margini, costi, tasse e dividendi."
                .to_string()
        };
        Ok(text)
    }
}

#[derive(Serialize)]
struct GenerateContentRequest {
    #[serde(rename = "systemInstruction")]
    system_instruction: Content,
    contents: Vec<Content>,
}

#[derive(Serialize)]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'static str>,
    parts: Vec<Part>,
}

#[derive(Serialize)]
struct Part {
    text: String,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    candidates: Option<Vec<Candidate>>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    parts: Option<Vec<ResponsePart>>,
}

#[derive(Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

pub struct GeminiAdvisor {
    client: reqwest::blocking::Client,
    api_key: String,
    model: String,
    context: String,
}

impl GeminiAdvisor {
    pub fn new(api_key: String, context: String) -> Result<Self, AdvisorError> {
        Ok(Self {
            client: http_client()?,
            api_key,
            model: GEMINI_MODEL.to_string(),
            context,
        })
    }

    fn request_body(&self, history: &[ChatMessage], message: &str) -> GenerateContentRequest {
        // the API wants the conversation to open with a user turn
        let mut contents: Vec<Content> = history
            .iter()
            .skip_while(|m| m.role == Role::Model)
            .map(|m| Content {
                role: Some(match m.role {
                    Role::User => "user",
                    Role::Model => "model",
                }),
                parts: vec![Part { text: m.text.clone() }],
            })
            .collect();
        contents.push(Content {
            role: Some("user"),
            parts: vec![Part { text: message.to_string() }],
        });
        GenerateContentRequest {
            system_instruction: Content {
                role: None,
                parts: vec![Part { text: self.context.clone() }],
            },
            contents,
        }
    }
}

impl Advisor for GeminiAdvisor {
    fn name(&self) -> &'static str {
        "gemini"
    }

    fn reply(&self, history: &[ChatMessage], message: &str) -> Result<String, AdvisorError> {
        let url = format!(
            "https://generativelanguage.googleapis.com/v1beta/models/{}:generateContent",
            self.model
        );
        debug!(model = %self.model, turns = history.len(), "sending chat turn");
        let resp = self
            .client
            .post(url)
            .header("x-goog-api-key", &self.api_key)
            .json(&self.request_body(history, message))
            .send()?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().unwrap_or_default();
            return Err(AdvisorError::Status {
                status: status.as_u16(),
                body: body.chars().take(200).collect(),
            });
        }
        let parsed: GenerateContentResponse = resp.json()?;
        parsed
            .candidates
            .into_iter()
            .flatten()
            .filter_map(|c| c.content)
            .filter_map(|c| c.parts)
            .flatten()
            .filter_map(|p| p.text)
            .reduce(|a, b| a + &b)
            .filter(|t| !t.trim().is_empty())
            .ok_or(AdvisorError::Empty)
    }
}

/// Picks the live advisor when a key is available, the canned one otherwise.
pub fn advisor_for(
    api_key: Option<String>,
    kpis: &FinancialKpis,
    transactions: &[Transaction],
    budgets: &[ProjectBudget],
) -> Result<Box<dyn Advisor>, AdvisorError> {
    match api_key {
        Some(key) => {
            info!("using Gemini advisor");
            let ctx = build_context(kpis, transactions, budgets);
            Ok(Box::new(GeminiAdvisor::new(key, ctx)?))
        }
        None => {
            info!("no API key configured, using canned advisor");
            Ok(Box::new(CannedAdvisor::new(kpis.clone())))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kpi::{calculate_kpis, top_costs};
    use crate::models::TransactionType;
    use chrono::NaiveDate;

    fn sample() -> Vec<Transaction> {
        let d = NaiveDate::from_ymd_opt(2023, 10, 15).unwrap();
        vec![
            Transaction::new("1", d, "Ricavi Commessa Campana", Decimal::from(26650), TransactionType::Revenue, Category::Other, Some("Campana".into())).unwrap(),
            Transaction::new("2", d, "Costi Cantiere Campana", Decimal::from(21150), TransactionType::Cost, Category::Construction, Some("Campana".into())).unwrap(),
        ]
    }

    #[test]
    fn canned_advisor_answers_tax_questions() {
        let kpis = calculate_kpis(&sample());
        let advisor = advisor_for(None, &kpis, &sample(), &[]).unwrap();
        assert_eq!(advisor.name(), "canned");
        let reply = advisor.reply(&[], "Quante tasse pago?").unwrap();
        assert!(reply.contains("€ 1.534,50"), "{}", reply);
    }

    #[test]
    fn canned_advice_flags_direct_costs() {
        let txs = sample();
        let kpis = calculate_kpis(&txs);
        let advisor = CannedAdvisor::new(kpis.clone());
        let text = advisor.advise(&advice_prompt(&kpis, &top_costs(&txs, 3))).unwrap();
        assert!(text.contains("EBITDA positivo di € 5.500,00"), "{}", text);
        assert!(text.contains("costi diretti di cantiere"));
        let empty = CannedAdvisor::new(FinancialKpis::default()).advise("").unwrap();
        assert!(empty.starts_with("Nessun movimento"));
    }

    #[test]
    fn canned_advisor_falls_back_to_demo_text() {
        let advisor = CannedAdvisor::new(FinancialKpis::default());
        let reply = advisor.reply(&[ChatMessage::model(GREETING)], "ciao").unwrap();
        assert!(reply.starts_with("Modalità demo"));
    }

    #[test]
    fn context_lists_projects_and_budgets() {
        let txs = sample();
        let budgets = vec![ProjectBudget {
            project_name: "Campana".into(),
            budget_revenue: Decimal::from(30000),
            budget_cost: Decimal::from(20000),
        }];
        let ctx = build_context(&calculate_kpis(&txs), &txs, &budgets);
        assert!(ctx.contains("EBITDA (MOL): € 5.500,00"));
        assert!(ctx.contains("- Campana: ricavi previsti € 30.000,00"));
        assert!(ctx.contains("Costi Cantiere Campana"));
    }

    #[test]
    fn advice_prompt_names_top_costs() {
        let txs = sample();
        let p = advice_prompt(&calculate_kpis(&txs), &top_costs(&txs, 3));
        assert!(p.contains("Costi Cantiere (Diretti): € 21.150,00"));
        assert!(!p.contains("EBIT (MON)"));
    }

    #[test]
    fn gemini_request_carries_history_and_context() {
        let advisor = GeminiAdvisor::new("k".into(), "ctx".into()).unwrap();
        let history = vec![
            ChatMessage::model(GREETING),
            ChatMessage::user("primo"),
            ChatMessage::model("risposta"),
        ];
        let body = advisor.request_body(&history, "domanda");
        let v = serde_json::to_value(&body).unwrap();
        assert_eq!(v["systemInstruction"]["parts"][0]["text"], "ctx");
        assert!(v["systemInstruction"].get("role").is_none());
        assert_eq!(v["contents"].as_array().unwrap().len(), 3);
        assert_eq!(v["contents"][0]["role"], "user");
        assert_eq!(v["contents"][1]["role"], "model");
        assert_eq!(v["contents"][2]["parts"][0]["text"], "domanda");
    }
}
