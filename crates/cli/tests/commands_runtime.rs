use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, OnceLock};

use clap::Parser;
use gestor_cli::commands::CommandResult;
use gestor_cli::{execute, Cli};
use rust_decimal::Decimal;
use serde_json::Value;
use tempfile::TempDir;

const QUOTES: &str = r#"[
  {
    "id": 42,
    "cliente": "Condomínio Jardim das Flores",
    "descricao": "Manutenção preventiva do portão",
    "valor_mao_obra": "1000",
    "valor_material": 800,
    "desconto_mdo_valor": null,
    "distancia_km": 10,
    "prazo_dias": "2",
    "valor_boleto": 5,
    "parcelamento_mdo": 2,
    "parcelamento_material": 1,
    "imposto_servico": 5,
    "imposto_material": "",
    "data_orcamento": "2024-01-15T09:00:00",
    "valor_total": 1928.5
  },
  {
    "id": "43",
    "valor_mao_obra": 600,
    "valor_material": 300,
    "distancia_km": 20,
    "prazo_dias": 1,
    "parcelamento_mdo": 0,
    "parcelamento_material": 3,
    "material_a_vista": "sim",
    "data_orcamento": "2024-01-31"
  },
  {
    "id": 44,
    "valor_mao_obra": 100,
    "distancia_km": 1e15,
    "prazo_dias": 1e15,
    "valor_material": 1e15,
    "juros_am": 1e20,
    "parcelamento_material": 2,
    "data_orcamento": "2024-01-15"
  }
]"#;

#[test]
fn quote_prints_text_sheet_with_payment_plans() {
    with_env(&[], || {
        let (_dir, path) = quotes_file(QUOTES);
        let result = gestor(&["quote", "--file", as_arg(&path), "--id", "42"]);

        assert_eq!(result.exit_code, 0, "expected successful pricing: {}", result.output);
        assert!(result.output.contains("Orçamento 42 - Condomínio Jardim das Flores"));
        assert!(result.output.contains("deslocamento: R$ 60,00"));
        assert!(result.output.contains("subtotal: R$ 1.123,50"));
        assert!(result.output.contains("pagamento: 2x de R$ 561,75"));
        assert!(result.output.contains("pagamento: 30dd - R$ 805,00"));
        assert!(result.output.contains("Total registrado: R$ 1.928,50"));
        assert!(result.output.contains("Validade: 14/02/2024"));
    });
}

#[test]
fn quote_json_output_carries_full_breakdown() {
    with_env(&[], || {
        let (_dir, path) = quotes_file(QUOTES);
        let result = gestor(&[
            "quote",
            "--file",
            as_arg(&path),
            "--id",
            "43",
            "--valor-por-km",
            "2",
            "--json",
        ]);

        assert_eq!(result.exit_code, 0, "expected successful pricing: {}", result.output);
        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "quote");
        assert_eq!(payload["status"], "ok");

        let sheet = &payload["sheet"];
        assert_eq!(sheet["valor_por_km_source"], "settings");
        assert_eq!(sheet["evaluation"]["labor_payment"], "Sem cobrança");
        assert_eq!(sheet["evaluation"]["material_payment"], "À vista - R$ 380,00");
        assert_eq!(sheet["evaluation"]["valid_until"], "01/03/2024");
        assert_eq!(decimal(&sheet["evaluation"]["pricing"]["subtotals"]["labor"]), Decimal::ZERO);
        // 300 + boleto 0 + travel 20 * 2 * 2 * 1
        assert_eq!(
            decimal(&sheet["evaluation"]["pricing"]["subtotals"]["material"]),
            Decimal::from(380)
        );
    });
}

#[test]
fn quote_uses_configured_rate_when_no_live_rate_is_given() {
    with_env(&[("GESTOR_PRICING_VALOR_POR_KM", "2.5")], || {
        let (_dir, path) = quotes_file(QUOTES);
        let result = gestor(&["quote", "--file", as_arg(&path), "--id", "42", "--json"]);

        assert_eq!(result.exit_code, 0, "expected successful pricing: {}", result.output);
        let payload = parse_payload(&result.output);
        assert_eq!(payload["sheet"]["valor_por_km_source"], "fallback");
        assert_eq!(
            decimal(&payload["sheet"]["evaluation"]["pricing"]["surcharges"]["travel_cost"]),
            Decimal::from(100)
        );
    });
}

#[test]
fn unreadable_live_rate_falls_back_to_configuration() {
    with_env(&[], || {
        let (_dir, path) = quotes_file(QUOTES);
        for junk in ["abc", "1,5", "-3"] {
            let result = gestor(&[
                "quote",
                "--file",
                as_arg(&path),
                "--id",
                "42",
                "--valor-por-km",
                junk,
                "--json",
            ]);

            assert_eq!(result.exit_code, 0, "expected successful pricing: {}", result.output);
            let sheet = &parse_payload(&result.output)["sheet"];
            assert_eq!(sheet["valor_por_km_source"], "fallback", "rate `{junk}`");
            assert_eq!(
                decimal(&sheet["evaluation"]["pricing"]["surcharges"]["travel_cost"]),
                Decimal::from(60)
            );
        }
    });
}

#[test]
fn quote_with_out_of_range_values_still_prices() {
    with_env(&[], || {
        let (_dir, path) = quotes_file(QUOTES);
        let result = gestor(&["quote", "--file", as_arg(&path), "--id", "44", "--json"]);

        assert_eq!(result.exit_code, 0, "expected successful pricing: {}", result.output);
        let pricing = &parse_payload(&result.output)["sheet"]["evaluation"]["pricing"];
        assert_eq!(decimal(&pricing["surcharges"]["travel_cost"]), Decimal::ZERO);
        assert_eq!(decimal(&pricing["surcharges"]["financing_interest"]), Decimal::ZERO);
    });
}

#[test]
fn quote_reports_missing_quote() {
    with_env(&[], || {
        let (_dir, path) = quotes_file(QUOTES);
        let result = gestor(&["quote", "--file", as_arg(&path), "--id", "999"]);

        assert_eq!(result.exit_code, 5, "expected quote not found code");
        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "quote");
        assert_eq!(payload["status"], "error");
        assert_eq!(payload["error_class"], "quote_not_found");
        assert_eq!(payload["user_message"], "Orçamento não encontrado.");
        assert_eq!(payload["correlation_id"], "quote:999");
    });
}

#[test]
fn quote_rejects_blank_id() {
    with_env(&[], || {
        let (_dir, path) = quotes_file(QUOTES);
        let result = gestor(&["quote", "--file", as_arg(&path), "--id", "  "]);

        assert_eq!(result.exit_code, 4, "expected input failure code");
        let payload = parse_payload(&result.output);
        assert_eq!(payload["error_class"], "input");
        assert_eq!(
            payload["user_message"],
            "Não foi possível processar a solicitação. Revise os dados."
        );
    });
}

#[test]
fn quote_reports_unreadable_input() {
    with_env(&[], || {
        let (_dir, path) = quotes_file("{ not json");
        let result = gestor(&["quote", "--file", as_arg(&path), "--id", "42"]);
        assert_eq!(result.exit_code, 4, "expected input failure code");
        assert_eq!(parse_payload(&result.output)["error_class"], "input");

        let missing = gestor(&["quote", "--file", "no/such/orcamentos.json", "--id", "42"]);
        assert_eq!(missing.exit_code, 4, "expected input failure code");
        let message = parse_payload(&missing.output)["message"].as_str().unwrap_or("").to_string();
        assert!(message.contains("could not read quotes file"));
    });
}

#[test]
fn quote_fails_fast_on_invalid_config() {
    with_env(&[("GESTOR_PRICING_VALIDITY_DAYS", "0")], || {
        let (_dir, path) = quotes_file(QUOTES);
        let result = gestor(&["quote", "--file", as_arg(&path), "--id", "42"]);

        assert_eq!(result.exit_code, 2, "expected config validation failure code");
        let payload = parse_payload(&result.output);
        assert_eq!(payload["error_class"], "config_validation");
        assert_eq!(payload["correlation_id"], "quote:42");
    });
}

#[test]
fn date_format_with_clock_fields_is_a_config_error() {
    with_env(&[("GESTOR_DISPLAY_DATE_FORMAT", "%d/%m/%Y %H:%M")], || {
        let (_dir, path) = quotes_file(QUOTES);
        let result = gestor(&["quote", "--file", as_arg(&path), "--id", "42"]);

        assert_eq!(result.exit_code, 2, "expected config validation failure code");
        let message = parse_payload(&result.output)["message"].as_str().unwrap_or("").to_string();
        assert!(message.contains("display.date_format"));
    });
}

#[test]
fn quote_without_any_file_is_an_input_error() {
    with_env(&[], || {
        let result = gestor(&["quote", "--id", "42"]);

        assert_eq!(result.exit_code, 4);
        assert_eq!(parse_payload(&result.output)["error_class"], "input");
    });
}

#[test]
fn config_reports_env_sources() {
    with_env(&[("GESTOR_PRICING_VALOR_POR_KM", "1.75")], || {
        let result = gestor(&["config"]);

        assert_eq!(result.exit_code, 0);
        assert!(result.output.contains(
            "- pricing.valor_por_km = 1.75 (source: env (GESTOR_PRICING_VALOR_POR_KM))"
        ));
        assert!(result.output.contains("- pricing.validity_days = 30 (source: default)"));
        assert!(result.output.contains("- display.currency_symbol = R$ (source: default)"));
    });
}

#[test]
fn config_reports_explicit_file_sources() {
    with_env(&[], || {
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("gestor.toml");
        fs::write(&path, "[pricing]\nvalidity_days = 15\n").expect("write config file");

        let result = gestor(&["--config", as_arg(&path), "config"]);

        assert_eq!(result.exit_code, 0, "expected config output: {}", result.output);
        let expected = format!("- pricing.validity_days = 15 (source: file ({}))", path.display());
        assert!(result.output.contains(&expected), "unexpected output: {}", result.output);
    });
}

#[test]
fn config_command_exits_with_config_code_when_invalid() {
    with_env(&[("GESTOR_PRICING_VALOR_POR_KM", "0")], || {
        let result = gestor(&["config"]);

        assert_eq!(result.exit_code, 2, "expected config validation failure code");
        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "config");
        assert_eq!(payload["error_class"], "config_validation");
    });

    with_env(&[], || {
        let result = gestor(&["--config", "no/such/gestor.toml", "config"]);
        assert_eq!(result.exit_code, 2, "missing explicit config file should fail");
    });
}

fn gestor(args: &[&str]) -> CommandResult {
    let cli = Cli::try_parse_from(std::iter::once("gestor").chain(args.iter().copied()))
        .expect("arguments should parse");
    execute(cli)
}

fn as_arg(path: &Path) -> &str {
    path.to_str().expect("temp paths are valid UTF-8")
}

fn quotes_file(contents: &str) -> (TempDir, PathBuf) {
    let dir = TempDir::new().expect("temp dir");
    let path = dir.path().join("orcamentos.json");
    fs::write(&path, contents).expect("write quotes file");
    (dir, path)
}

fn decimal(value: &Value) -> Decimal {
    value
        .as_str()
        .and_then(|raw| raw.parse().ok())
        .expect("decimal fields serialize as strings")
}

fn parse_payload(output: &str) -> Value {
    serde_json::from_str(output).expect("command output should be valid JSON")
}

fn with_env(vars: &[(&str, &str)], test_fn: impl FnOnce()) {
    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    let _guard =
        ENV_LOCK.get_or_init(|| Mutex::new(())).lock().expect("env mutex should not be poisoned");

    let keys = [
        "GESTOR_PRICING_VALOR_POR_KM",
        "GESTOR_PRICING_VALIDITY_DAYS",
        "GESTOR_DISPLAY_CURRENCY_SYMBOL",
        "GESTOR_DISPLAY_DATE_FORMAT",
        "GESTOR_STORAGE_QUOTES_FILE",
        "GESTOR_LOGGING_LEVEL",
        "GESTOR_LOGGING_FORMAT",
        "GESTOR_LOG_LEVEL",
        "GESTOR_LOG_FORMAT",
    ];

    let previous_values: Vec<(&str, Option<String>)> =
        keys.iter().map(|key| (*key, env::var(key).ok())).collect();

    for key in &keys {
        env::remove_var(key);
    }
    for (key, value) in vars {
        env::set_var(key, value);
    }

    test_fn();

    for (key, value) in previous_values {
        if let Some(value) = value {
            env::set_var(key, value);
        } else {
            env::remove_var(key);
        }
    }
}
