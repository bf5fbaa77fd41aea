// Document-type code catalog: the suffix of a designation such as
// `АБВГ.123456.002СБ` names the kind of document the sheet belongs to.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

const DRAWING_CODES: &[(&str, &str)] = &[
    ("СБ", "Сборочный чертеж"),
    ("ВО", "Чертеж общего вида"),
    ("ТЧ", "Теоретический чертеж"),
    ("ГЧ", "Габаритный чертеж"),
    ("МЭ", "Электромонтажный чертеж"),
    ("МЧ", "Монтажный чертеж"),
    ("УЧ", "Упаковочный чертеж"),
];

const REGISTER_CODES: &[(&str, &str)] = &[
    ("ВС", "Ведомость спецификаций"),
    ("ВД", "Ведомость ссылочных документов"),
    ("ВП", "Ведомость покупных изделий"),
    ("ВИ", "Ведомость разрешения применения покупных изделий"),
    ("ДП", "Ведомость держателей подлинников"),
    ("ПТ", "Ведомость технического предложения"),
    ("ЭП", "Ведомость эскизного проекта"),
    ("ТП", "Ведомость технического проекта"),
    ("ВДЭ", "Ведомость электронных документов"),
];

const TECHNICAL_CODES: &[(&str, &str)] = &[
    ("ПЗ", "Пояснительная записка"),
    ("ТУ", "Технические условия"),
    ("ПМ", "Программа и методика испытаний"),
    ("ТБ", "Таблицы"),
    ("РР", "Расчеты"),
    ("РЭ", "Руководство по эксплуатации"),
    ("ИМ", "Инструкция по монтажу, пуску, регулированию и обкатке изделия"),
    ("ФО", "Формуляр"),
    ("ПС", "Паспорт"),
    ("ЭТ", "Этикетка"),
    ("КИ", "Каталог изделия"),
    ("НЗЧ", "Нормы расхода запасных частей"),
    ("НМ", "Нормы расхода материалов"),
    ("ЗИ", "Ведомость ЗИП"),
    ("УП", "Учебно-технические плакаты"),
    ("ИС", "Инструкции эксплуатационные специальные"),
    ("ВЭ", "Ведомость эксплуатационных документов"),
];

const REPAIR_CODES: &[(&str, &str)] = &[
    ("РК", "Руководство по ремонту"),
    ("РС", "Руководство по ремонту"),
    ("УК", "Технические условия на ремонт"),
    ("УС", "Технические условия на ремонт"),
    ("ЗК", "Нормы расхода запасных частей на ремонт"),
    ("ЗС", "Нормы расхода запасных частей на ремонт"),
    ("МК", "Нормы расхода материалов на ремонт"),
    ("МС", "Нормы расхода материалов на ремонт"),
    ("ЗИК", "Ведомость ЗИП на ремонт"),
    ("ЗИС", "Ведомость ЗИП на ремонт"),
    ("ВРК", "Ведомость документов для ремонта"),
    ("ВРС", "Ведомость документов для ремонта"),
];

const SCHEME_CODES: &[(&str, &str)] = &[
    ("Э1", "Схема электрическая структурная"),
    ("Э2", "Схема электрическая функциональная"),
    ("Э3", "Схема электрическая принципиальная"),
    ("Э4", "Схема электрическая соединений"),
    ("Э5", "Схема электрическая подключения"),
    ("Э6", "Схема электрическая общая"),
    ("Э7", "Схема электрическая расположения"),
    ("Г1", "Схема гидравлическая структурная"),
    ("Г3", "Схема гидравлическая принципиальная"),
    ("Г4", "Схема гидравлическая соединения"),
    ("П1", "Схема пневматическая структурная"),
    ("П3", "Схема пневматическая принципиальная"),
    ("П4", "Схема пневматическая соединения"),
    ("Х1", "Схема газовая структурная"),
    ("Х3", "Схема газовая принципиальная"),
    ("Х4", "Схема газовая соединения"),
    ("К1", "Схема кинематическая структурная"),
    ("К2", "Схема кинематическая функциональная"),
    ("К3", "Схема кинематическая принципиальная"),
    ("В1", "Схема вакуумная структурная"),
    ("В3", "Схема вакуумная принципиальная"),
    ("В4", "Схема вакуумная соединений"),
    ("Л3", "Схема оптическая принципиальная"),
    ("Р1", "Схема энергетическая структурная"),
    ("Р2", "Схема энергетическая функциональная"),
    ("Р3", "Схема энергетическая принципиальная"),
    ("Р4", "Схема энергетическая соединений"),
    ("Р5", "Схема энергетическая подключения"),
    ("Р6", "Схема энергетическая общая"),
    ("Р7", "Схема энергетическая расположения"),
];

/// Read-only mapping from document-type code to its canonical name.
///
/// Built once and shared by reference with every component that needs it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentCodeCatalog {
    entries: BTreeMap<String, String>,
}

impl DocumentCodeCatalog {
    /// The complete built-in table: drawings, registers, technical and repair
    /// documentation plus scheme codes.
    pub fn builtin() -> Self {
        let entries = [
            DRAWING_CODES,
            REGISTER_CODES,
            TECHNICAL_CODES,
            REPAIR_CODES,
            SCHEME_CODES,
        ]
        .iter()
        .flat_map(|table| table.iter())
        .map(|(code, name)| (code.to_string(), name.to_string()))
        .collect();

        Self { entries }
    }

    pub fn from_entries<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            entries: entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Parse a flat YAML map of `code: name` pairs
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let entries: BTreeMap<String, String> = serde_yaml::from_str(yaml)?;
        Ok(Self { entries })
    }

    /// Builtin table overlaid with entries from YAML
    pub fn extended_with_yaml(mut self, yaml: &str) -> Result<Self> {
        let extra = Self::from_yaml_str(yaml)?;
        self.entries.extend(extra.entries);
        Ok(self)
    }

    pub fn name_for(&self, code: &str) -> Option<&str> {
        self.entries.get(code).map(String::as_str)
    }

    pub fn contains(&self, code: &str) -> bool {
        self.entries.contains_key(code)
    }

    /// Entries in sorted code order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for DocumentCodeCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Split the type suffix off a designation like `АБВГ.123456.002СБ`.
///
/// The suffix is whatever follows the last run of version digits: either
/// letters only (`СБ`, `ВДЭ`) or one letter followed by one digit (`Э3`).
/// Returns `None` when the designation carries no suffix.
pub fn type_suffix(code: &str) -> Option<String> {
    let chars: Vec<char> = code.chars().collect();
    let mut end = chars.len();

    // Scheme codes end in a digit preceded by exactly one letter, which in
    // turn follows the version digits.
    if end >= 3
        && chars[end - 1].is_ascii_digit()
        && chars[end - 2].is_alphabetic()
        && chars[end - 3].is_ascii_digit()
    {
        let suffix: String = chars[end - 2..].iter().collect();
        return Some(suffix.to_uppercase());
    }

    while end > 0 && chars[end - 1].is_alphabetic() {
        end -= 1;
    }
    if end == chars.len() || end == 0 || !chars[end - 1].is_ascii_digit() {
        return None;
    }
    let suffix: String = chars[end..].iter().collect();
    Some(suffix.to_uppercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_catalog_lookup() {
        let catalog = DocumentCodeCatalog::builtin();
        assert_eq!(catalog.name_for("СБ"), Some("Сборочный чертеж"));
        assert_eq!(catalog.name_for("ВДЭ"), Some("Ведомость электронных документов"));
        assert_eq!(catalog.name_for("Э3"), Some("Схема электрическая принципиальная"));
        assert_eq!(catalog.name_for("ZZ"), None);
        assert_eq!(catalog.len(), 7 + 9 + 17 + 12 + 30);
    }

    #[test]
    fn test_iteration_is_sorted() {
        let catalog = DocumentCodeCatalog::builtin();
        let codes: Vec<&str> = catalog.iter().map(|(code, _)| code).collect();
        let mut sorted = codes.clone();
        sorted.sort();
        assert_eq!(codes, sorted);
    }

    #[test]
    fn test_yaml_extension() {
        let catalog = DocumentCodeCatalog::builtin()
            .extended_with_yaml("ДЧ: Деталировочный чертеж\n")
            .unwrap();
        assert_eq!(catalog.name_for("ДЧ"), Some("Деталировочный чертеж"));
        assert!(catalog.contains("СБ"));
    }

    #[test]
    fn test_type_suffix() {
        assert_eq!(type_suffix("АБВГ.123456.002СБ").as_deref(), Some("СБ"));
        assert_eq!(type_suffix("АБВГ.123456.002сб").as_deref(), Some("СБ"));
        assert_eq!(type_suffix("АБВГ.123456.002ВДЭ").as_deref(), Some("ВДЭ"));
        assert_eq!(type_suffix("АБВГ.123456.002Э3").as_deref(), Some("Э3"));
        assert_eq!(type_suffix("АБВГ.123456.002"), None);
    }
}
