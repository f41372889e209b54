//! Canonical field names, header-matching patterns, and the projection of
//! loosely typed sheet rows into per-field raw records. This is the only
//! place where header-keyed data exists inside the module; everything
//! downstream works on the projected shapes.

use tabular::mapper::{ColumnMapping, FieldPatterns};
use tabular::sheet::{Cell, Sheet};

// Canonical fields: users.
pub const USER_DPI: &str = "dpi";
pub const USER_NAME: &str = "nombre";
pub const USER_BIRTH_DATE: &str = "fechaNacimiento";
pub const USER_HIRE_DATE: &str = "fechaIngreso";
pub const USER_LEVEL: &str = "nivel";
pub const USER_TITLE: &str = "cargo";
pub const USER_AREA: &str = "area";
pub const USER_GENDER: &str = "genero";

// Canonical fields: assignments.
pub const ASSIGN_COLLABORATOR: &str = "colaborador_dpi";
pub const ASSIGN_SUPERVISOR: &str = "jefe_dpi";
pub const ASSIGN_GROUP: &str = "grupo_id";

/// Header patterns for user files, in match-priority order.
pub const USER_FIELD_PATTERNS: &[FieldPatterns] = &[
    FieldPatterns {
        field: USER_BIRTH_DATE,
        patterns: &["nacimiento", "birth"],
    },
    FieldPatterns {
        field: USER_HIRE_DATE,
        patterns: &["ingreso", "hire", "contrat"],
    },
    FieldPatterns {
        field: USER_DPI,
        patterns: &["dpi", "documento", "identific", "cui"],
    },
    FieldPatterns {
        field: USER_NAME,
        patterns: &["nombre", "name"],
    },
    FieldPatterns {
        field: USER_LEVEL,
        patterns: &["nivel", "grado"],
    },
    FieldPatterns {
        field: USER_TITLE,
        patterns: &["cargo", "puesto", "titulo"],
    },
    FieldPatterns {
        field: USER_AREA,
        patterns: &["area", "área", "departamento", "unidad"],
    },
    FieldPatterns {
        field: USER_GENDER,
        patterns: &["genero", "género", "sexo", "gender"],
    },
];

/// Header patterns for assignment files. The supervisor entry comes first so
/// that "evaluador" is claimed before the "evaluado" substring can match the
/// collaborator entry.
pub const ASSIGNMENT_FIELD_PATTERNS: &[FieldPatterns] = &[
    FieldPatterns {
        field: ASSIGN_SUPERVISOR,
        patterns: &["jefe", "supervisor", "evaluador"],
    },
    FieldPatterns {
        field: ASSIGN_COLLABORATOR,
        patterns: &["colaborador", "empleado", "evaluado", "dpi"],
    },
    FieldPatterns {
        field: ASSIGN_GROUP,
        patterns: &["grupo", "group"],
    },
];

/// Raw per-field user row, pre-normalization.
#[derive(Debug, Clone)]
pub struct RawUserRow {
    pub dpi: Cell,
    pub name: Cell,
    pub birth_date: Cell,
    pub hire_date: Cell,
    pub level: Cell,
    pub title: Cell,
    pub area: Cell,
    pub gender: Cell,
}

/// Raw per-field assignment row, pre-normalization.
#[derive(Debug, Clone)]
pub struct RawAssignmentRow {
    pub collaborator: Cell,
    pub supervisor: Cell,
    pub group: Cell,
}

fn column_of(sheet: &Sheet, mapping: &ColumnMapping, field: &str) -> Option<usize> {
    mapping
        .header_for(field)
        .and_then(|header| sheet.column_index(header))
}

/// Project sheet rows through the mapping into raw user rows. Unmapped
/// fields come through as empty cells; the validator decides what that means
/// per field.
pub fn project_users(sheet: &Sheet, mapping: &ColumnMapping) -> Vec<RawUserRow> {
    let dpi = column_of(sheet, mapping, USER_DPI);
    let name = column_of(sheet, mapping, USER_NAME);
    let birth = column_of(sheet, mapping, USER_BIRTH_DATE);
    let hire = column_of(sheet, mapping, USER_HIRE_DATE);
    let level = column_of(sheet, mapping, USER_LEVEL);
    let title = column_of(sheet, mapping, USER_TITLE);
    let area = column_of(sheet, mapping, USER_AREA);
    let gender = column_of(sheet, mapping, USER_GENDER);

    (0..sheet.rows.len())
        .map(|row| RawUserRow {
            dpi: pick(sheet, row, dpi),
            name: pick(sheet, row, name),
            birth_date: pick(sheet, row, birth),
            hire_date: pick(sheet, row, hire),
            level: pick(sheet, row, level),
            title: pick(sheet, row, title),
            area: pick(sheet, row, area),
            gender: pick(sheet, row, gender),
        })
        .collect()
}

pub fn project_assignments(sheet: &Sheet, mapping: &ColumnMapping) -> Vec<RawAssignmentRow> {
    let collaborator = column_of(sheet, mapping, ASSIGN_COLLABORATOR);
    let supervisor = column_of(sheet, mapping, ASSIGN_SUPERVISOR);
    let group = column_of(sheet, mapping, ASSIGN_GROUP);

    (0..sheet.rows.len())
        .map(|row| RawAssignmentRow {
            collaborator: pick(sheet, row, collaborator),
            supervisor: pick(sheet, row, supervisor),
            group: pick(sheet, row, group),
        })
        .collect()
}

fn pick(sheet: &Sheet, row: usize, column: Option<usize>) -> Cell {
    column.map(|c| sheet.cell(row, c)).unwrap_or(Cell::Empty)
}

/// Canonical user template: headers plus sample rows.
pub fn user_template() -> (Vec<&'static str>, Vec<Vec<&'static str>>) {
    (
        vec![
            USER_DPI,
            USER_NAME,
            USER_BIRTH_DATE,
            USER_HIRE_DATE,
            USER_LEVEL,
            USER_TITLE,
            USER_AREA,
            USER_GENDER,
        ],
        vec![
            vec![
                "1234567890123",
                "Ana Maria Lopez",
                "15031990",
                "2021-06-01",
                "TEC",
                "Tecnico de Campo",
                "Obras",
                "F",
            ],
            vec![
                "9876543210987",
                "Luis Paz",
                "02111985",
                "",
                "DIR",
                "Director Municipal",
                "Planificacion",
                "M",
            ],
        ],
    )
}

/// Canonical assignment template.
pub fn assignment_template() -> (Vec<&'static str>, Vec<Vec<&'static str>>) {
    (
        vec![ASSIGN_COLLABORATOR, ASSIGN_SUPERVISOR, ASSIGN_GROUP],
        vec![
            vec!["1234567890123", "9876543210987", "G-01"],
            vec!["5555555555555", "9876543210987", ""],
        ],
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use tabular::mapper::ColumnMapping;

    #[test]
    fn user_headers_map_to_canonical_fields() {
        let headers: Vec<String> = [
            "DPI",
            "Nombre Completo",
            "Fecha de Nacimiento",
            "Fecha de Ingreso",
            "Nivel",
            "Cargo Nominal",
            "Área",
            "Género",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();
        let mapping = ColumnMapping::auto(&headers, USER_FIELD_PATTERNS);
        assert_eq!(mapping.header_for(USER_DPI), Some("DPI"));
        assert_eq!(mapping.header_for(USER_NAME), Some("Nombre Completo"));
        assert_eq!(
            mapping.header_for(USER_BIRTH_DATE),
            Some("Fecha de Nacimiento")
        );
        assert_eq!(mapping.header_for(USER_HIRE_DATE), Some("Fecha de Ingreso"));
        assert_eq!(mapping.header_for(USER_LEVEL), Some("Nivel"));
        assert_eq!(mapping.header_for(USER_TITLE), Some("Cargo Nominal"));
        assert_eq!(mapping.header_for(USER_AREA), Some("Área"));
        assert_eq!(mapping.header_for(USER_GENDER), Some("Género"));
    }

    #[test]
    fn evaluador_header_is_claimed_by_the_supervisor_field() {
        let headers: Vec<String> = ["Evaluador", "Evaluado"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let mapping = ColumnMapping::auto(&headers, ASSIGNMENT_FIELD_PATTERNS);
        assert_eq!(mapping.header_for(ASSIGN_SUPERVISOR), Some("Evaluador"));
        assert_eq!(mapping.header_for(ASSIGN_COLLABORATOR), Some("Evaluado"));
    }
}
