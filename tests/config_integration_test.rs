use anyhow::Result;
use req2dom::app::{build_models, build_pipeline};
use req2dom::config::toml_config::TomlConfig;
use req2dom::utils::validation::Validate;
use req2dom::{GenerationEngine, LocalStorage};
use std::io::Write;
use tempfile::{NamedTempFile, TempDir};

const SHOP: &str = "RF01: O cliente deve poder registar-se fornecendo nome, email e telefone. \
RF02: O cliente pode adicionar produtos ao carrinho.";

fn write_temp(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

#[tokio::test]
async fn test_toml_config_drives_engine_output() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let output_path = temp_dir.path().to_str().unwrap().replace('\\', "/");

    let config_file = write_temp(&format!(
        r#"
[pipeline]
strategy = "grammar"
language = "auto"

[layout]
max_columns = 2
cell_width = 300.0

[output]
path = "{}"
filename = "loja"
format = "json"
"#,
        output_path
    ));

    let config = TomlConfig::from_file(config_file.path())?;
    config.validate()?;

    let models = build_models(&config)?;
    let pipeline = build_pipeline(&config, models)?;
    let storage = LocalStorage::new(config.output.path.clone());
    let engine = GenerationEngine::new(pipeline, storage, config.output.filename.clone());

    let report = engine.run(SHOP).await?;
    assert!(report.output_path.ends_with("loja.json"));

    let written = std::fs::read_to_string(temp_dir.path().join("loja.json"))?;
    let value: serde_json::Value = serde_json::from_str(&written)?;
    assert_eq!(value["classes"]["class-cliente"]["name"], "Cliente");
    assert_eq!(report.output.document.metadata.columns, 2);
    Ok(())
}

#[tokio::test]
async fn test_lexicon_override_file() -> Result<()> {
    let lexicon = write_temp(
        r#"
[pt]
stop_nouns = ["carrinho"]

[pt.attributes]
nif = "String"
"#,
    );
    let config = TomlConfig::from_toml_str(&format!(
        "[grammar]\nlexicon_file = \"{}\"\n",
        lexicon.path().to_str().unwrap().replace('\\', "/")
    ))?;
    config.validate()?;

    let models = build_models(&config)?;
    let pipeline = build_pipeline(&config, models)?;
    let output = pipeline.run(SHOP).await?;

    assert!(output.model.class_by_name("Carrinho").is_none());
    assert!(output.model.class_by_name("Cliente").is_some());
    assert!(output.model.class_by_name("Produto").is_some());
    Ok(())
}

#[tokio::test]
async fn test_custom_code_pattern() {
    let config = TomlConfig::from_toml_str(
        r#"
[segmenter]
code_pattern = '(?m)^(?P<prefix>REQ)-(?P<number>\d+)\s*[:.]\s*'
"#,
    )
    .unwrap();
    config.validate().unwrap();

    let pipeline = build_pipeline(&config, build_models(&config).unwrap()).unwrap();
    let output = pipeline
        .run("REQ-2: O cliente pode adicionar produtos ao carrinho.\nREQ-1: O cliente tem um nome.")
        .await
        .unwrap();

    let codes: Vec<&str> = output
        .units
        .iter()
        .map(|u| u.code.as_deref().unwrap())
        .collect();
    assert_eq!(codes, vec!["REQ-1", "REQ-2"]);
}

#[test]
fn test_missing_lexicon_file_is_an_error() {
    let config =
        TomlConfig::from_toml_str("[grammar]\nlexicon_file = \"/nonexistent/lexicon.toml\"\n")
            .unwrap();
    assert!(build_models(&config).is_err());
}
