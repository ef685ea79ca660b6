use contracts::usecases::u501_import_residents::ImportSchema;

/// Raw fields of one usable data line, mapped positionally per schema.
/// Columns the schema does not carry stay empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawRow {
    /// 1-based line number in the source file (header is line 1)
    pub line: usize,
    pub block_label: String,
    pub apartment_label: String,
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub tax_id: String,
    pub owner_token: String,
    pub responsible_token: String,
}

impl RawRow {
    /// A line only becomes a candidate when at least one identifying
    /// field survives trimming. Filters trailing blank lines without
    /// depending on exact column count.
    pub fn has_identifying_field(&self) -> bool {
        !self.full_name.is_empty()
            || !self.email.is_empty()
            || !self.block_label.is_empty()
            || !self.apartment_label.is_empty()
    }
}

/// Tokenize raw file text into ordered rows.
///
/// The first line is always a header and is discarded. CRLF and LF both
/// work, blank lines are dropped, double quotes protect embedded commas,
/// every field is trimmed. Rows shorter than the schema are padded with
/// empty strings; extra trailing fields are ignored.
pub fn parse_rows(text: &str, schema: ImportSchema) -> Vec<RawRow> {
    // Strip UTF-8 BOM if present
    let text = text.trim_start_matches('\u{FEFF}');

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());

    let mut rows = Vec::new();

    for result in reader.records() {
        let record = match result {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!("Skipping malformed CSV record: {}", e);
                continue;
            }
        };

        let line = record
            .position()
            .map(|p| p.line() as usize)
            .unwrap_or(0);

        let field = |i: usize| record.get(i).unwrap_or("").trim().to_string();

        let row = match schema {
            ImportSchema::Full => RawRow {
                line,
                block_label: field(0),
                apartment_label: field(1),
                full_name: field(2),
                email: field(3),
                phone: field(4),
                tax_id: field(5),
                owner_token: field(6),
                responsible_token: field(7),
            },
            ImportSchema::Reduced => RawRow {
                line,
                block_label: field(0),
                apartment_label: field(1),
                full_name: field(2),
                phone: field(3),
                owner_token: field(4),
                responsible_token: field(5),
                ..Default::default()
            },
        };

        if row.has_identifying_field() {
            rows.push(row);
        }
    }

    rows
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_only_file_yields_no_rows() {
        let rows = parse_rows(
            "block,apartment,name,email,phone,taxId,owner,responsible\n",
            ImportSchema::Full,
        );
        assert!(rows.is_empty());
    }

    #[test]
    fn maps_full_schema_positionally() {
        let text = "block,apartment,name,email,phone,taxId,owner,responsible\n\
                    BLOCO 1,101,João da Silva,joao@email.com,11999990000,39053344705,sim,nao\n";
        let rows = parse_rows(text, ImportSchema::Full);
        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        assert_eq!(row.line, 2);
        assert_eq!(row.block_label, "BLOCO 1");
        assert_eq!(row.apartment_label, "101");
        assert_eq!(row.full_name, "João da Silva");
        assert_eq!(row.email, "joao@email.com");
        assert_eq!(row.phone, "11999990000");
        assert_eq!(row.tax_id, "39053344705");
        assert_eq!(row.owner_token, "sim");
        assert_eq!(row.responsible_token, "nao");
    }

    #[test]
    fn maps_reduced_schema_without_email_or_tax_id() {
        let text = "block,apartment,name,phone,owner,responsible\n\
                    BLOCO 2,201,Maria Santos,11988887777,s,1\n";
        let rows = parse_rows(text, ImportSchema::Reduced);
        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        assert_eq!(row.full_name, "Maria Santos");
        assert_eq!(row.phone, "11988887777");
        assert_eq!(row.email, "");
        assert_eq!(row.tax_id, "");
        assert_eq!(row.owner_token, "s");
        assert_eq!(row.responsible_token, "1");
    }

    #[test]
    fn quoted_fields_keep_embedded_commas() {
        let text = "block,apartment,name,email,phone,taxId,owner,responsible\n\
                    \"BLOCO 1\",101,\"Silva, João da\",joao@email.com,,,,\n";
        let rows = parse_rows(text, ImportSchema::Full);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].full_name, "Silva, João da");
        assert_eq!(rows[0].block_label, "BLOCO 1");
    }

    #[test]
    fn short_rows_pad_missing_trailing_columns() {
        let text = "block,apartment,name,email,phone,taxId,owner,responsible\n\
                    BLOCO 1,101,João da Silva\n";
        let rows = parse_rows(text, ImportSchema::Full);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].email, "");
        assert_eq!(rows[0].owner_token, "");
    }

    #[test]
    fn extra_trailing_columns_are_ignored() {
        let text = "block,apartment,name,phone,owner,responsible\n\
                    BLOCO 1,101,João,119999,sim,nao,surplus,more\n";
        let rows = parse_rows(text, ImportSchema::Reduced);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].responsible_token, "nao");
    }

    #[test]
    fn blank_and_comma_only_lines_are_dropped() {
        let text = "block,apartment,name,email,phone,taxId,owner,responsible\r\n\
                    BLOCO 1,101,João,joao@email.com,,,,\r\n\
                    \r\n\
                    ,,,,,,,\r\n";
        let rows = parse_rows(text, ImportSchema::Full);
        assert_eq!(rows.len(), 1);
    }

    #[test]
    fn bom_is_stripped_before_parsing() {
        let text = "\u{FEFF}block,apartment,name,phone,owner,responsible\n\
                    BLOCO 1,101,João,119999,,\n";
        let rows = parse_rows(text, ImportSchema::Reduced);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].block_label, "BLOCO 1");
    }

    #[test]
    fn fields_are_trimmed() {
        let text = "block,apartment,name,phone,owner,responsible\n\
                    \x20 BLOCO 1 , 101 , João , 119999 , sim , nao \n";
        let rows = parse_rows(text, ImportSchema::Reduced);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].block_label, "BLOCO 1");
        assert_eq!(rows[0].apartment_label, "101");
        assert_eq!(rows[0].owner_token, "sim");
    }
}
