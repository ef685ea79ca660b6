use contracts::usecases::u501_import_residents::ImportSchema;

/// Suggested download name for the template file, derived from the
/// condominium name: lowercased, spaces replaced with underscores.
pub fn template_file_name(condominium_name: &str) -> String {
    let slug = condominium_name
        .trim()
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_");
    format!("modelo_importacao_{}.csv", slug)
}

pub fn template_content(schema: ImportSchema) -> String {
    schema.template().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_name_slugifies_the_condominium_name() {
        assert_eq!(
            template_file_name("Residencial Jardim das Flores"),
            "modelo_importacao_residencial_jardim_das_flores.csv"
        );
        assert_eq!(
            template_file_name("  Vila  Nova  "),
            "modelo_importacao_vila_nova.csv"
        );
    }

    #[test]
    fn template_matches_the_schema_header() {
        let full = template_content(ImportSchema::Full);
        assert!(full.starts_with(ImportSchema::Full.header()));
        let reduced = template_content(ImportSchema::Reduced);
        assert!(reduced.starts_with(ImportSchema::Reduced.header()));
        assert_ne!(full, reduced);
    }
}
