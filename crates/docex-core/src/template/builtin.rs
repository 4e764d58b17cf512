//! Templates compiled into the binary.
//!
//! These form the default template set used when no template folder is given.

/// Built-in template sources as (name, YAML content).
pub static BUILTIN_TEMPLATES: &[(&str, &str)] = &[
    (
        "builtin:pl/faktura-vat.yml",
        include_str!("../../templates/pl/faktura-vat.yml"),
    ),
    (
        "builtin:com/cloud-hosting.yml",
        include_str!("../../templates/com/cloud-hosting.yml"),
    ),
    (
        "builtin:generic/invoice.yml",
        include_str!("../../templates/generic/invoice.yml"),
    ),
];
