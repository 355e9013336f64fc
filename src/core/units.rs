//! Catalog 03: units of measure (UN/ECE Recommendation 20).
//!
//! The full recommendation has about two thousand codes; this covers the
//! subset commonly accepted on Peruvian sales documents.

/// Unit code used when a line does not state one (goods, "unidad").
pub const DEFAULT_UNIT_CODE: &str = "NIU";

/// Check whether `code` is a known unit code.
pub fn is_known_unit_code(code: &str) -> bool {
    UNIT_CODES.binary_search(&code).is_ok()
}

/// Sorted for binary search.
static UNIT_CODES: &[&str] = &[
    "4A",  // Bobina
    "BE",  // Fardo
    "BG",  // Bolsa
    "BJ",  // Balde
    "BLL", // Barril
    "BO",  // Botella
    "BX",  // Caja
    "C62", // Piezas
    "CA",  // Lata
    "CEN", // Ciento de unidades
    "CJ",  // Cono
    "CMK", // Centímetro cuadrado
    "CMQ", // Centímetro cúbico
    "CMT", // Centímetro lineal
    "CT",  // Cartones
    "CY",  // Cilindro
    "DAY", // Día
    "DZN", // Docena
    "FOT", // Pie
    "GLI", // Galón inglés
    "GLL", // Galón US
    "GRM", // Gramo
    "HUR", // Hora
    "INH", // Pulgada
    "KGM", // Kilogramo
    "KT",  // Kit
    "KWH", // Kilovatio hora
    "LBR", // Libra
    "LTR", // Litro
    "MGM", // Miligramo
    "MIL", // Millar
    "MLT", // Mililitro
    "MMT", // Milímetro
    "MON", // Mes
    "MTK", // Metro cuadrado
    "MTQ", // Metro cúbico
    "MTR", // Metro
    "NIU", // Unidad (bienes)
    "PK",  // Paquete
    "PR",  // Par
    "RO",  // Rollo
    "SET", // Juego
    "TNE", // Tonelada
    "TU",  // Tubo
    "ZZ",  // Unidad (servicios)
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_sorted() {
        assert!(UNIT_CODES.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn lookup() {
        assert!(is_known_unit_code("NIU"));
        assert!(is_known_unit_code("ZZ"));
        assert!(is_known_unit_code("KGM"));
        assert!(!is_known_unit_code("niu"));
        assert!(!is_known_unit_code("XYZ"));
    }
}
