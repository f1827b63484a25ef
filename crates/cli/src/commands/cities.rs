use procura_ops::OpsClient;

use crate::OutputFormat;

pub async fn run(ops: &mut OpsClient, format: &OutputFormat) -> anyhow::Result<()> {
    let cities = ops.cities().get().await?;
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(cities)?);
        }
        OutputFormat::Text => {
            for c in cities {
                println!("  {:>3} | {} | {} | {}", c.city_id, c.city_name, c.city_name_ru, c.city_name_kz);
            }
        }
    }
    Ok(())
}
