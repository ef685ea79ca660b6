use serde::{Deserialize, Serialize};

/// Column layout of the import file. Columns are positional; the first
/// line of the file is always a header and is discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportSchema {
    /// block, apartment, name, email, phone, taxId, owner, responsible
    Full,
    /// block, apartment, name, phone, owner, responsible
    Reduced,
}

impl ImportSchema {
    /// Reduced files carry no email column, which also disables
    /// duplicate detection for them.
    pub fn has_email(&self) -> bool {
        matches!(self, ImportSchema::Full)
    }

    pub fn has_tax_id(&self) -> bool {
        matches!(self, ImportSchema::Full)
    }

    pub fn header(&self) -> &'static str {
        match self {
            ImportSchema::Full => "block,apartment,name,email,phone,taxId,owner,responsible",
            ImportSchema::Reduced => "block,apartment,name,phone,owner,responsible",
        }
    }

    /// Downloadable template: header plus illustrative rows. Static data,
    /// kept as a table keyed by variant.
    pub fn template(&self) -> &'static str {
        match self {
            ImportSchema::Full => {
                "block,apartment,name,email,phone,taxId,owner,responsible\n\
                 BLOCO 1,101,João da Silva,joao@email.com,11999990000,39053344705,sim,sim\n\
                 BLOCO 1,102,Maria Santos,maria@email.com,11988887777,,nao,sim\n"
            }
            ImportSchema::Reduced => {
                "block,apartment,name,phone,owner,responsible\n\
                 BLOCO 1,101,João da Silva,11999990000,sim,sim\n\
                 BLOCO 1,102,Maria Santos,11988887777,nao,sim\n"
            }
        }
    }
}
