//! SQLite schema definitions and SQL query constants.
//!
//! This module contains the SQL statements used by the SQLite repository,
//! following the Functional Core pattern - pure data, no I/O. Statements over
//! `animais` are built at runtime because its columns come from the imported
//! spreadsheet.

/// SQL statement to create the batch tables.
pub const CREATE_TABLES: &str = r#"
-- Batches
CREATE TABLE IF NOT EXISTS lotes (
    numero INTEGER PRIMARY KEY,
    criado_em TEXT,
    status TEXT NOT NULL DEFAULT 'pendente',
    concluido_em TEXT,
    gta_saida TEXT
);

-- Links between batches and animal rows
CREATE TABLE IF NOT EXISTS lote_itens (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    lote_numero INTEGER NOT NULL,
    animal_rowid INTEGER NOT NULL,
    UNIQUE(lote_numero, animal_rowid)
);

CREATE INDEX IF NOT EXISTS idx_lote_itens_lote ON lote_itens(lote_numero);
"#;

/// Columns added to a legacy `lotes` table that predates batch status.
pub const LEGACY_LOTE_COLUMNS: [(&str, &str); 3] = [
    (
        "status",
        "ALTER TABLE lotes ADD COLUMN status TEXT NOT NULL DEFAULT 'pendente'",
    ),
    (
        "concluido_em",
        "ALTER TABLE lotes ADD COLUMN concluido_em TEXT",
    ),
    ("gta_saida", "ALTER TABLE lotes ADD COLUMN gta_saida TEXT"),
];

/// One batch per animal row.
pub const CREATE_UNIQUE_ANIMAL_INDEX: &str =
    "CREATE UNIQUE INDEX IF NOT EXISTS idx_lote_itens_animal ON lote_itens(animal_rowid)";

pub const TABLE_EXISTS: &str =
    "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1 LIMIT 1";

// ============================================================================
// Batch queries
// ============================================================================

pub const SELECT_LOTES_WITH_COUNTS: &str = r#"
SELECT l.numero, l.criado_em, l.status, l.concluido_em, l.gta_saida, COUNT(li.id)
FROM lotes l
LEFT JOIN lote_itens li ON li.lote_numero = l.numero
GROUP BY l.numero
ORDER BY l.numero
"#;

pub const SELECT_LOTE_BY_NUMERO: &str = r#"
SELECT numero, criado_em, status, concluido_em, gta_saida
FROM lotes
WHERE numero = ?1
"#;

pub const INSERT_LOTE_IF_MISSING: &str =
    "INSERT OR IGNORE INTO lotes (numero, criado_em) VALUES (?1, ?2)";

pub const UPDATE_LOTE_STATUS: &str =
    "UPDATE lotes SET status = ?1, concluido_em = ?2, gta_saida = ?3 WHERE numero = ?4";

pub const DELETE_LOTE_ITEMS: &str = "DELETE FROM lote_itens WHERE lote_numero = ?1";

pub const DELETE_LOTE: &str = "DELETE FROM lotes WHERE numero = ?1";

pub const INSERT_LOTE_ITEM: &str =
    "INSERT INTO lote_itens (lote_numero, animal_rowid) VALUES (?1, ?2)";

pub const DELETE_LOTE_ITEM: &str =
    "DELETE FROM lote_itens WHERE lote_numero = ?1 AND animal_rowid = ?2";

pub const SELECT_LOTES_OF_ANIMAL: &str =
    "SELECT DISTINCT lote_numero FROM lote_itens WHERE animal_rowid = ?1 ORDER BY lote_numero";

pub const SELECT_LOTE_ANIMALS: &str = r#"
SELECT a.rowid, a.*
FROM lote_itens li
JOIN animais a ON a.rowid = li.animal_rowid
WHERE li.lote_numero = ?1
ORDER BY li.id
"#;

// ============================================================================
// Animal queries
// ============================================================================

pub const SELECT_ANIMALS: &str = "SELECT rowid, * FROM animais ORDER BY rowid";

pub const SELECT_ANIMAL_BY_ROWID: &str = "SELECT rowid, * FROM animais WHERE rowid = ?1";

pub const ANIMAL_EXISTS: &str = "SELECT 1 FROM animais WHERE rowid = ?1";

pub const SELECT_ANIMALS_BY_LACRE: &str = r#"
SELECT rowid, * FROM animais
WHERE CAST(Lacre AS TEXT) = ?1 OR (?2 IS NOT NULL AND Lacre = ?2)
ORDER BY rowid
"#;

// ============================================================================
// Duplicate queries
// ============================================================================

pub const SELECT_DUPLICATE_GROUPS: &str = r#"
SELECT CAST(Lacre AS TEXT), COUNT(*) AS cnt
FROM animais
WHERE Lacre IS NOT NULL AND TRIM(Lacre) <> ''
GROUP BY Lacre
HAVING COUNT(*) > 1
ORDER BY cnt DESC, Lacre
"#;

pub const SELECT_ANIMALS_WITH_TAG: &str =
    "SELECT rowid, * FROM animais WHERE TRIM(Lacre) = ?1 ORDER BY rowid";

// ============================================================================
// Dashboard queries
// ============================================================================

pub const COUNT_ANIMALS: &str = "SELECT COUNT(*) FROM animais";

pub const COUNT_DUPLICATE_TAGS: &str = r#"
SELECT COUNT(*), COALESCE(SUM(cnt), 0) FROM (
    SELECT COUNT(*) AS cnt FROM animais
    WHERE Lacre IS NOT NULL AND TRIM(Lacre) <> ''
    GROUP BY Lacre HAVING COUNT(*) > 1
)
"#;

pub const COUNT_ANIMALS_IN_LOTES: &str = r#"
SELECT COUNT(DISTINCT li.animal_rowid)
FROM lote_itens li
JOIN animais a ON a.rowid = li.animal_rowid
"#;

pub const COUNT_ANIMALS_OUTSIDE_LOTES: &str = r#"
SELECT COUNT(*) FROM animais a
WHERE NOT EXISTS (SELECT 1 FROM lote_itens li WHERE li.animal_rowid = a.rowid)
"#;

pub const COUNT_ANIMALS_WITHOUT_TAG: &str =
    "SELECT COUNT(*) FROM animais WHERE Lacre IS NULL OR TRIM(Lacre) = ''";

pub const COUNT_DISTINCT_TAGS: &str =
    "SELECT COUNT(DISTINCT Lacre) FROM animais WHERE Lacre IS NOT NULL AND TRIM(Lacre) <> ''";

pub const COUNT_DISTINCT_OWNERS: &str =
    r#"SELECT COUNT(DISTINCT "Proprietário Origem") FROM animais"#;

pub const COUNT_LOTES_BY_STATUS: &str = r#"
SELECT
    COUNT(*),
    COALESCE(SUM(CASE WHEN COALESCE(status, 'pendente') = 'concluido' THEN 0 ELSE 1 END), 0),
    COALESCE(SUM(CASE WHEN COALESCE(status, 'pendente') = 'concluido' THEN 1 ELSE 0 END), 0)
FROM lotes
"#;

pub const COUNT_LOTE_ITEMS: &str = r#"
SELECT
    (SELECT COUNT(*) FROM lote_itens),
    (SELECT COUNT(DISTINCT lote_numero) FROM lote_itens),
    (SELECT AVG(c * 1.0) FROM (SELECT COUNT(*) AS c FROM lote_itens GROUP BY lote_numero))
"#;
