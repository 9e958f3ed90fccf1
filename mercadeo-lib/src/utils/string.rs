/// Normalize text by replacing control characters with spaces and collapsing whitespace
/// Used for Excel headers and free-text cells, which often carry line breaks from the export
pub fn normalize_string(value: &str) -> String {
    return value
        .chars() // Process character by character
        .map(|c| {
            if c.is_control() {
                ' ' // Replace control characters (newlines, tabs, etc.) with spaces
            } else {
                c
            }
        })
        .collect::<String>()
        .split_whitespace() // Split on whitespace to normalize multiple spaces
        .collect::<Vec<&str>>()
        .join(" "); // Join back with single spaces
}

/// Replace accented Latin letters with their base letter ("Radiografía" -> "Radiografia")
pub fn fold_accents(value: &str) -> String {
    value
        .chars()
        .map(|c| match c {
            'á' | 'à' | 'ä' | 'â' | 'ã' | 'å' => 'a',
            'Á' | 'À' | 'Ä' | 'Â' | 'Ã' | 'Å' => 'A',
            'é' | 'è' | 'ë' | 'ê' => 'e',
            'É' | 'È' | 'Ë' | 'Ê' => 'E',
            'í' | 'ì' | 'ï' | 'î' => 'i',
            'Í' | 'Ì' | 'Ï' | 'Î' => 'I',
            'ó' | 'ò' | 'ö' | 'ô' | 'õ' => 'o',
            'Ó' | 'Ò' | 'Ö' | 'Ô' | 'Õ' => 'O',
            'ú' | 'ù' | 'ü' | 'û' => 'u',
            'Ú' | 'Ù' | 'Ü' | 'Û' => 'U',
            'ñ' => 'n',
            'Ñ' => 'N',
            'ç' => 'c',
            'Ç' => 'C',
            other => other,
        })
        .collect()
}

/// Lowercase, accent-free text with collapsed whitespace.
pub fn normalize_text(value: &str) -> String {
    normalize_string(&fold_accents(value)).to_lowercase()
}

/// Key used to compare column names: lowercase ASCII letters and digits only,
/// so "Forma de pago", "forma_pago" and "FORMA-PAGO" all compare equal.
pub fn normalize_column_name(value: &str) -> String {
    fold_accents(value)
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect()
}
