use tabled::Tabled;

#[derive(Tabled)]
pub struct StepRow {
    pub step: String,
    pub attempted: u64,
    pub succeeded: u64,
    #[tabled(rename = "transport")]
    pub failed_transport: u64,
    #[tabled(rename = "parse")]
    pub failed_parse: u64,
    #[tabled(rename = "business")]
    pub failed_business: u64,
    #[tabled(rename = "no data")]
    pub no_usable_data: u64,
    #[tabled(display = "opt_float2")]
    pub avg_time_ms: Option<f64>,
    #[tabled(display = "opt_float2")]
    pub min_time_ms: Option<f64>,
    #[tabled(display = "opt_float2")]
    pub max_time_ms: Option<f64>,
}

fn opt_float2(n: &Option<f64>) -> String {
    match n {
        Some(n) => format!("{:.2}", n),
        None => "-".to_string(),
    }
}
