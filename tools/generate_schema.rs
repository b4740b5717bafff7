//! JSON Schema + Markdown生成ツール
//!
//! src/domain/config.rsの設定構造から以下を自動生成します：
//! 1. JSON Schema (schema/config.json)
//! 2. Markdownドキュメント (CONFIGURATION.md)
//!
//! 実行方法:
//! ```
//! cargo run --bin generate_schema
//! ```

use schemars::schema_for;
use serde_json::{Map, Value};
use std::fs;
use HollowMan::domain::config::AppConfig;

fn main() {
    println!("JSON Schema + Markdown生成中...");

    // AppConfigからJSON Schemaを生成
    let schema = schema_for!(AppConfig);

    // JSON文字列に変換（prettify）
    let json = serde_json::to_string_pretty(&schema).expect("Failed to serialize schema to JSON");

    // schema/ディレクトリを作成
    fs::create_dir_all("schema").expect("Failed to create schema/ directory");

    fs::write("schema/config.json", json.clone()).expect("Failed to write schema/config.json");
    println!("  ✓ schema/config.json");

    // JSON Schemaをパースしてマークダウン生成
    let schema_value: Value =
        serde_json::from_str(&json).expect("Failed to parse generated schema");
    let markdown = generate_markdown(&schema_value);

    fs::write("CONFIGURATION.md", markdown).expect("Failed to write CONFIGURATION.md");
    println!("  ✓ CONFIGURATION.md");

    println!("✅ 生成完了: schema/config.json + CONFIGURATION.md");
}

/// JSON Schemaからマークダウンドキュメントを生成
fn generate_markdown(schema: &Value) -> String {
    let mut md = String::new();

    md.push_str("# 設定リファレンス (Configuration Reference)\n\n");

    md.push_str("## 概要\n\n");
    md.push_str("`config.toml`ファイルは、HollowManと付属バイナリの動作を制御する設定ファイルです。\n");
    md.push_str("デフォルト値のままでも動作します（赤色を対象にした透明マント効果）。\n\n");

    md.push_str("**設定ファイルの場所**: `config.toml` (プロジェクトルート)  \n");
    md.push_str("**スキーマファイル**: `schema/config.json` (自動生成)  \n");
    md.push_str("**サンプル**: `config.toml.example`\n\n");

    md.push_str("⚠️ **注意**: このドキュメント（CONFIGURATION.md）は `cargo run --bin generate_schema` で自動生成されます。\n");
    md.push_str("設定項目の説明を変更する場合は、`src/domain/config.rs`のdoc commentsを編集してください。\n\n");

    md.push_str("## 設定ファイルの読み込み\n\n");
    md.push_str("- `config.toml`が存在する場合: ファイルから読み込み\n");
    md.push_str("- ファイルが存在しない場合: デフォルト値を使用（警告ログ出力）\n");
    md.push_str("- パース失敗時: デフォルト値を使用（警告ログ出力）\n\n");

    md.push_str("## 設定項目\n\n");

    // $defsを取得してマップを作成
    let defs = schema
        .get("$defs")
        .and_then(|d| d.as_object())
        .cloned()
        .unwrap_or_default();

    // トップレベルのプロパティを処理
    if let Some(props) = schema.get("properties").and_then(|p| p.as_object()) {
        for (key, prop) in props {
            let section_name = format_section_name(key);
            md.push_str(&format!("### [{}] - {}\n\n", key, section_name));

            if let Some(desc) = prop.get("description").and_then(|d| d.as_str()) {
                md.push_str(&format!("{}\n\n", desc));
            }

            if let Some(def_schema) = resolve_ref(prop, &defs) {
                generate_properties_table(&mut md, def_schema, &defs);
            } else if prop.get("properties").is_some() {
                generate_properties_table(&mut md, prop, &defs);
            }
        }
    }

    md
}

/// $ref（配列itemsの$refを含む）を定義に解決
fn resolve_ref<'a>(schema: &Value, defs: &'a Map<String, Value>) -> Option<&'a Value> {
    let ref_str = schema
        .get("$ref")
        .or_else(|| schema.get("items").and_then(|i| i.get("$ref")))
        .and_then(|r| r.as_str())?;
    let def_name = ref_str.strip_prefix("#/$defs/")?;
    defs.get(def_name)
}

/// プロパティテーブルを生成
fn generate_properties_table(md: &mut String, schema: &Value, defs: &Map<String, Value>) {
    let Some(props) = schema.get("properties").and_then(|p| p.as_object()) else {
        return;
    };
    if props.is_empty() {
        return;
    }

    // テーブルヘッダー
    md.push_str("| 設定項目 | 型 | デフォルト | 説明 |\n");
    md.push_str("|---------|-----|---------|---------|\n");

    for (prop_key, prop_schema) in props {
        let field_name = format!("`{}`", prop_key);
        let type_str = get_type_string(prop_schema).replace('|', "\\|");
        let default = get_default_value(prop_schema);
        let description = get_description(prop_schema);

        md.push_str(&format!(
            "| {} | {} | {} | {} |\n",
            field_name, type_str, default, description
        ));
    }
    md.push('\n');

    // ネストされたオブジェクト（$ref/配列$refを持つプロパティ）をサブセクションとして処理
    for (prop_key, prop_schema) in props {
        if let Some(def_schema) = resolve_ref(prop_schema, defs) {
            if def_schema.get("properties").is_some() {
                let subsection_name = format_section_name(prop_key);
                md.push_str(&format!("#### [{}] - {}\n\n", prop_key, subsection_name));

                if let Some(desc) = def_schema.get("description").and_then(|d| d.as_str()) {
                    md.push_str(&format!("{}\n\n", desc));
                }

                generate_properties_table(md, def_schema, defs);
            }
        }
    }
}

/// 型を文字列で取得
fn get_type_string(schema: &Value) -> String {
    if schema.get("$ref").is_some() {
        return "object".to_string();
    }

    match schema.get("type") {
        Some(Value::String(type_str)) => match type_str.as_str() {
            "integer" | "number" => schema
                .get("format")
                .and_then(|f| f.as_str())
                .unwrap_or(type_str)
                .to_string(),
            "boolean" => "bool".to_string(),
            other => other.to_string(),
        },
        Some(Value::Array(types)) => {
            let type_strs: Vec<&str> = types.iter().filter_map(|t| t.as_str()).collect();
            type_strs.join(" | ")
        }
        _ => "unknown".to_string(),
    }
}

/// デフォルト値を取得
fn get_default_value(schema: &Value) -> String {
    match schema.get("default") {
        Some(Value::String(s)) => format!("`\"{}\"`", s),
        Some(Value::Number(n)) => format!("`{}`", n),
        Some(Value::Bool(b)) => format!("`{}`", b),
        Some(Value::Null) => "`null`".to_string(),
        _ => "-".to_string(),
    }
}

/// 説明文を取得
fn get_description(schema: &Value) -> String {
    if let Some(desc) = schema.get("description").and_then(|d| d.as_str()) {
        // 改行を<br>に、パイプをエスケープ
        return desc
            .replace("\n\n", "<br><br>")
            .replace('\n', " ")
            .replace('|', "\\|");
    }
    "-".to_string()
}

/// セクション名をフォーマット
fn format_section_name(key: &str) -> String {
    match key {
        "camera" => "カメラ設定".to_string(),
        "background" => "背景画像設定".to_string(),
        "mask" => "色マスク設定".to_string(),
        "display" => "表示設定".to_string(),
        "stats" => "統計設定".to_string(),
        "hue_bands" => "HSVレンジ".to_string(),
        _ => key.to_string(),
    }
}
