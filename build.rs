fn main() {
    // Operator secrets are baked in at build time; rebuild when they change.
    for var in [
        "ALARM_WIFI_SSID",
        "ALARM_WIFI_PASSWORD",
        "ALARM_CODE_ARM_COUNTDOWN",
        "ALARM_CODE_ARM_IMMEDIATE",
        "ALARM_CODE_DISARM",
        "ALARM_NOTIFY_IP",
    ] {
        println!("cargo:rerun-if-env-changed={var}");
    }

    #[cfg(feature = "espidf")]
    embuild::espidf::sysenv::output();
}
