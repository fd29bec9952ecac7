//! LGPD-oriented masking of personal identifiers in free text, applied
//! before docket content leaves the engine (logs, exports, notifications).

use std::sync::LazyLock;

use regex::Regex;

static CPF: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d{3}\.\d{3}\.\d{3}-\d{2}").expect("valid CPF pattern"));
static CNPJ: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d{2}\.\d{3}\.\d{3}/\d{4}-\d{2}").expect("valid CNPJ pattern"));
static EMAIL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\w.\-]+@[\w.\-]+\.\w+").expect("valid email pattern"));
static PHONE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\(\d{2}\)\s?\d{4,5}-?\d{4}").expect("valid phone pattern"));

/// Mask CPF, CNPJ, email, and Brazilian phone numbers.
pub fn anonymize_personal_data(text: &str) -> String {
    let text = CPF.replace_all(text, "***.***.***-**");
    let text = CNPJ.replace_all(&text, "**.***.***/****-**");
    let text = EMAIL.replace_all(&text, "***@***.***");
    PHONE.replace_all(&text, "(**) *****-****").into_owned()
}
