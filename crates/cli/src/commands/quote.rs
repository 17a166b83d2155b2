use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Args;
use gestor_core::config::AppConfig;
use gestor_core::format::CurrencyFormat;
use gestor_core::numeric::safe_number_str;
use gestor_core::repositories::{InMemoryQuoteRepository, StaticPricingSettings};
use gestor_core::{InterfaceError, QuoteId, QuoteSheet, QuoteSheetService};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::commands::CommandResult;

#[derive(Debug, Clone, Args)]
pub struct QuoteArgs {
    #[arg(long, help = "JSON export of stored quotes (array or single record)")]
    pub file: Option<PathBuf>,
    #[arg(long, help = "Quote id to price")]
    pub id: String,
    #[arg(
        long = "valor-por-km",
        allow_hyphen_values = true,
        help = "Live rate per km as stored in settings; unusable values fall back to configuration"
    )]
    pub valor_por_km: Option<String>,
    #[arg(long, help = "Emit machine-readable JSON output")]
    pub json: bool,
}

#[derive(Debug, Serialize)]
struct QuotePayload<'a> {
    command: &'static str,
    status: &'static str,
    sheet: &'a QuoteSheet,
}

pub fn correlation_id(id: &str) -> String {
    format!("quote:{}", id.trim())
}

/// Expects `config` to already carry `--file` as `storage.quotes_file`.
pub fn run(args: QuoteArgs, config: &AppConfig) -> CommandResult {
    let Some(quotes_file) = config.storage.quotes_file.as_deref() else {
        return CommandResult::failure(
            "quote",
            "input",
            "no quotes file given (use --file or storage.quotes_file)",
            4,
        );
    };

    let repository = match load_repository(quotes_file) {
        Ok(repository) => repository,
        Err(error) => return CommandResult::failure("quote", "input", format!("{error:#}"), 4),
    };

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return CommandResult::failure(
                "quote",
                "runtime_init",
                format!("failed to initialize async runtime: {error}"),
                3,
            );
        }
    };

    let context = config.pricing_context();
    let currency = context.currency.clone();
    let live_rate = args.valor_por_km.as_deref().map(safe_number_str);
    let service =
        QuoteSheetService::new(repository, StaticPricingSettings::new(live_rate), context);
    let quote_id = QuoteId(args.id.trim().to_string());

    match runtime.block_on(service.render(&quote_id)) {
        Ok(sheet) if args.json => {
            let payload = QuotePayload { command: "quote", status: "ok", sheet: &sheet };
            match serde_json::to_string_pretty(&payload) {
                Ok(output) => CommandResult { exit_code: 0, output },
                Err(error) => {
                    CommandResult::failure("quote", "serialization", error.to_string(), 1)
                }
            }
        }
        Ok(sheet) => CommandResult { exit_code: 0, output: render_sheet(&sheet, &currency) },
        Err(error) => {
            let interface = error.into_interface(correlation_id(&args.id));
            let (error_class, exit_code) = match &interface {
                InterfaceError::BadRequest { .. } => ("input", 4),
                InterfaceError::NotFound { .. } => ("quote_not_found", 5),
                InterfaceError::ServiceUnavailable { .. } => ("persistence", 6),
                InterfaceError::Internal { .. } => ("internal", 1),
            };
            CommandResult::interface_failure("quote", error_class, &interface, exit_code)
        }
    }
}

fn load_repository(path: &Path) -> anyhow::Result<InMemoryQuoteRepository> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("could not read quotes file `{}`", path.display()))?;
    InMemoryQuoteRepository::from_json(&raw)
        .with_context(|| format!("could not decode quotes file `{}`", path.display()))
}

fn render_sheet(sheet: &QuoteSheet, currency: &CurrencyFormat) -> String {
    let quote = &sheet.quote;
    let pricing = &sheet.evaluation.pricing;
    let money = |value: Decimal| currency.format(value);

    let mut lines = Vec::new();
    match quote.cliente.as_deref() {
        Some(cliente) => lines.push(format!("Orçamento {} - {cliente}", quote.id)),
        None => lines.push(format!("Orçamento {}", quote.id)),
    }
    if let Some(descricao) = quote.descricao.as_deref() {
        lines.push(descricao.to_string());
    }

    lines.push(String::new());
    lines.push("Mão de obra".to_string());
    lines.push(format!("  valor: {}", money(quote.valor_mao_obra)));
    lines.push(format!(
        "  desconto: {} ({}%)",
        money(quote.desconto_mdo_valor),
        quote.desconto_mdo_percent.normalize()
    ));
    lines.push(format!(
        "  deslocamento: {} ({} km, {} dias, {}/km)",
        money(pricing.surcharges.travel_cost),
        quote.distancia_km.normalize(),
        quote.prazo_dias.normalize(),
        money(sheet.valor_por_km)
    ));
    lines.push(format!("  boleto: {}", money(pricing.surcharges.boleto_fee_labor)));
    lines.push(format!(
        "  imposto ({}%): {}",
        quote.imposto_servico.normalize(),
        money(pricing.taxes.service_tax)
    ));
    lines.push(format!("  subtotal: {}", money(pricing.subtotals.labor)));
    lines.push(format!("  pagamento: {}", sheet.evaluation.labor_payment));

    lines.push(String::new());
    lines.push("Material".to_string());
    lines.push(format!("  valor: {}", money(quote.valor_material)));
    lines.push(format!(
        "  juros ({}% a.m.): {}",
        quote.juros_am.normalize(),
        money(pricing.surcharges.financing_interest)
    ));
    lines.push(format!("  boleto: {}", money(pricing.surcharges.boleto_fee_material)));
    lines.push(format!(
        "  imposto ({}%): {}",
        quote.imposto_material.normalize(),
        money(pricing.taxes.material_tax)
    ));
    lines.push(format!("  subtotal: {}", money(pricing.subtotals.material)));
    lines.push(format!("  pagamento: {}", sheet.evaluation.material_payment));

    lines.push(String::new());
    lines.push(format!("Desconto: {}", money(quote.desconto)));
    lines.push(format!("Total calculado: {}", money(pricing.computed_total)));
    lines.push(format!("Total registrado: {}", money(pricing.stored_total)));
    lines.push(format!(
        "Validade: {}",
        sheet.evaluation.valid_until.as_deref().unwrap_or("-")
    ));

    lines.join("\n")
}
