fn main() {
    // ESP-IDF link arguments are only needed for device builds; host
    // builds (tests, fuzzing) skip embuild entirely.
    #[cfg(feature = "espidf")]
    embuild::espidf::sysenv::output();
}
