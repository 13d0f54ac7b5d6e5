use crate::config::AppConfig;

const DASHBOARD_HTML: &str = include_str!("dashboard.html");

// Fill in the dashboard page template from the configuration
pub fn create_page(config: &AppConfig) -> String {
    let refresh_ms = config.server.refresh_secs.max(1).saturating_mul(1000);

    let mut page = DASHBOARD_HTML.to_string();
    page = page.replace("{REFRESH_MS}", &refresh_ms.to_string());
    page = page.replace("{HISTORY_SIZE}", &config.reader.history_size.to_string());
    page = page.replace("{TIMEZONE}", &config.time.timezone);
    page = page.replace("{DRY_VOLTAGE}", &format!("{:.2}", config.calibration.dry_voltage));
    page = page.replace("{WET_VOLTAGE}", &format!("{:.2}", config.calibration.wet_voltage));
    page
}
