pub const AMPCOVER_DISPLAY_VERSION: &str = env!("AMPCOVER_DISPLAY_VERSION");
pub const AMPCOVER_BUILD_N: &str = env!("AMPCOVER_BUILD_N");

pub fn version_cli_text() -> String {
    format!(
        "ampcover {}\nBuild {}\nAdaptive multiplex PCR primer-pool design",
        AMPCOVER_DISPLAY_VERSION, AMPCOVER_BUILD_N
    )
}
