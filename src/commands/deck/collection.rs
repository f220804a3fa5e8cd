use std::path::Path;

use anyhow::{Context, Result};
use rusqlite::{Connection, Transaction, params};
use serde_json::{Value, json};

use super::ids::field_checksum;

pub(super) const FIELD_NAMES: [&str; 2] = ["Page_num", "Html"];
const FIELD_SEPARATOR: &str = "\x1f";
const DEFAULT_DECK_ID: i64 = 1;

/// Note type plus the deck every card lands in.
#[derive(Debug, Clone)]
pub(super) struct DeckModel {
    pub model_id: i64,
    pub model_name: String,
    pub deck_id: i64,
    pub deck_name: String,
    pub css: String,
    pub front_template: String,
    pub back_template: String,
}

#[derive(Debug, Clone)]
pub(super) struct NoteRow {
    pub guid: String,
    pub note_id: i64,
    pub card_id: i64,
    pub fields: [String; 2],
}

/// Writes a schema-11 collection database at `path`, replacing any file
/// already there.
pub(super) fn write_collection(
    path: &Path,
    model: &DeckModel,
    notes: &[NoteRow],
    now_secs: i64,
) -> Result<()> {
    if path.exists() {
        std::fs::remove_file(path)
            .with_context(|| format!("failed to remove stale {}", path.display()))?;
    }

    let mut connection = Connection::open(path)
        .with_context(|| format!("failed to create collection {}", path.display()))?;
    ensure_schema(&connection)?;

    let tx = connection
        .transaction()
        .context("failed to start collection transaction")?;
    insert_collection_row(&tx, model, now_secs)?;
    insert_notes(&tx, model, notes, now_secs)?;
    tx.commit().context("failed to commit collection")?;

    Ok(())
}

fn ensure_schema(connection: &Connection) -> Result<()> {
    connection
        .execute_batch(
            "
            CREATE TABLE col (
              id INTEGER PRIMARY KEY,
              crt INTEGER NOT NULL,
              mod INTEGER NOT NULL,
              scm INTEGER NOT NULL,
              ver INTEGER NOT NULL,
              dty INTEGER NOT NULL,
              usn INTEGER NOT NULL,
              ls INTEGER NOT NULL,
              conf TEXT NOT NULL,
              models TEXT NOT NULL,
              decks TEXT NOT NULL,
              dconf TEXT NOT NULL,
              tags TEXT NOT NULL
            );

            CREATE TABLE notes (
              id INTEGER PRIMARY KEY,
              guid TEXT NOT NULL,
              mid INTEGER NOT NULL,
              mod INTEGER NOT NULL,
              usn INTEGER NOT NULL,
              tags TEXT NOT NULL,
              flds TEXT NOT NULL,
              sfld INTEGER NOT NULL,
              csum INTEGER NOT NULL,
              flags INTEGER NOT NULL,
              data TEXT NOT NULL
            );

            CREATE TABLE cards (
              id INTEGER PRIMARY KEY,
              nid INTEGER NOT NULL,
              did INTEGER NOT NULL,
              ord INTEGER NOT NULL,
              mod INTEGER NOT NULL,
              usn INTEGER NOT NULL,
              type INTEGER NOT NULL,
              queue INTEGER NOT NULL,
              due INTEGER NOT NULL,
              ivl INTEGER NOT NULL,
              factor INTEGER NOT NULL,
              reps INTEGER NOT NULL,
              lapses INTEGER NOT NULL,
              left INTEGER NOT NULL,
              odue INTEGER NOT NULL,
              odid INTEGER NOT NULL,
              flags INTEGER NOT NULL,
              data TEXT NOT NULL
            );

            CREATE TABLE revlog (
              id INTEGER PRIMARY KEY,
              cid INTEGER NOT NULL,
              usn INTEGER NOT NULL,
              ease INTEGER NOT NULL,
              ivl INTEGER NOT NULL,
              lastIvl INTEGER NOT NULL,
              factor INTEGER NOT NULL,
              time INTEGER NOT NULL,
              type INTEGER NOT NULL
            );

            CREATE TABLE graves (
              usn INTEGER NOT NULL,
              oid INTEGER NOT NULL,
              type INTEGER NOT NULL
            );

            CREATE INDEX ix_notes_usn ON notes (usn);
            CREATE INDEX ix_cards_usn ON cards (usn);
            CREATE INDEX ix_revlog_usn ON revlog (usn);
            CREATE INDEX ix_cards_nid ON cards (nid);
            CREATE INDEX ix_cards_sched ON cards (did, queue, due);
            CREATE INDEX ix_revlog_cid ON revlog (cid);
            CREATE INDEX ix_notes_csum ON notes (csum);
            ",
        )
        .context("failed to create collection schema")
}

fn insert_collection_row(tx: &Transaction<'_>, model: &DeckModel, now_secs: i64) -> Result<()> {
    let now_millis = now_secs * 1000;
    let conf = json!({
        "activeDecks": [DEFAULT_DECK_ID],
        "curDeck": DEFAULT_DECK_ID,
        "newSpread": 0,
        "collapseTime": 1200,
        "timeLim": 0,
        "estTimes": true,
        "dueCounts": true,
        "curModel": Value::Null,
        "nextPos": 1,
        "sortType": "noteFld",
        "sortBackwards": false,
        "addToCur": true
    });

    let mut models = serde_json::Map::new();
    models.insert(model.model_id.to_string(), model_json(model, now_secs));

    let mut decks = serde_json::Map::new();
    decks.insert(
        DEFAULT_DECK_ID.to_string(),
        deck_json(DEFAULT_DECK_ID, "Default", now_secs),
    );
    decks.insert(
        model.deck_id.to_string(),
        deck_json(model.deck_id, &model.deck_name, now_secs),
    );

    let dconf = json!({ "1": deck_options_json() });

    tx.execute(
        "INSERT INTO col (id, crt, mod, scm, ver, dty, usn, ls, conf, models, decks, dconf, tags)
         VALUES (1, ?1, ?2, ?2, 11, 0, 0, 0, ?3, ?4, ?5, ?6, '{}')",
        params![
            now_secs,
            now_millis,
            conf.to_string(),
            Value::Object(models).to_string(),
            Value::Object(decks).to_string(),
            dconf.to_string(),
        ],
    )
    .context("failed to insert collection row")?;

    Ok(())
}

fn insert_notes(
    tx: &Transaction<'_>,
    model: &DeckModel,
    notes: &[NoteRow],
    now_secs: i64,
) -> Result<()> {
    let mut note_stmt = tx.prepare(
        "INSERT INTO notes (id, guid, mid, mod, usn, tags, flds, sfld, csum, flags, data)
         VALUES (?1, ?2, ?3, ?4, -1, '', ?5, ?6, ?7, 0, '')",
    )?;
    let mut card_stmt = tx.prepare(
        "INSERT INTO cards (id, nid, did, ord, mod, usn, type, queue, due, ivl, factor, reps,
                            lapses, left, odue, odid, flags, data)
         VALUES (?1, ?2, ?3, 0, ?4, -1, 0, 0, ?5, 0, 0, 0, 0, 0, 0, 0, 0, '')",
    )?;

    for (position, note) in notes.iter().enumerate() {
        let sort_field = &note.fields[0];
        note_stmt
            .execute(params![
                note.note_id,
                note.guid,
                model.model_id,
                now_secs,
                note.fields.join(FIELD_SEPARATOR),
                sort_field,
                field_checksum(sort_field),
            ])
            .with_context(|| format!("failed to insert note {sort_field}"))?;

        card_stmt
            .execute(params![
                note.card_id,
                note.note_id,
                model.deck_id,
                now_secs,
                position as i64 + 1,
            ])
            .with_context(|| format!("failed to insert card for note {sort_field}"))?;
    }

    Ok(())
}

fn model_json(model: &DeckModel, now_secs: i64) -> Value {
    let fields = FIELD_NAMES
        .iter()
        .enumerate()
        .map(|(ord, name)| {
            json!({
                "name": name,
                "ord": ord,
                "font": "Arial",
                "media": [],
                "rtl": false,
                "size": 20,
                "sticky": false
            })
        })
        .collect::<Vec<Value>>();

    json!({
        "id": model.model_id,
        "name": model.model_name,
        "type": 0,
        "mod": now_secs,
        "usn": -1,
        "sortf": 0,
        "did": model.deck_id,
        "flds": fields,
        "tmpls": [{
            "name": "Card 1",
            "ord": 0,
            "qfmt": model.front_template,
            "afmt": model.back_template,
            "bqfmt": "",
            "bafmt": "",
            "did": Value::Null
        }],
        "css": model.css,
        "latexPre": "\\documentclass[12pt]{article}\n\\special{papersize=3in,5in}\n\\usepackage[utf8]{inputenc}\n\\usepackage{amssymb,amsmath}\n\\pagestyle{empty}\n\\setlength{\\parindent}{0in}\n\\begin{document}\n",
        "latexPost": "\\end{document}",
        "req": [[0, "all", [1]]],
        "tags": [],
        "vers": []
    })
}

fn deck_json(id: i64, name: &str, now_secs: i64) -> Value {
    json!({
        "id": id,
        "name": name,
        "desc": "",
        "mod": now_secs,
        "usn": -1,
        "collapsed": false,
        "browserCollapsed": false,
        "dyn": 0,
        "conf": 1,
        "extendNew": 10,
        "extendRev": 50,
        "lrnToday": [0, 0],
        "newToday": [0, 0],
        "revToday": [0, 0],
        "timeToday": [0, 0]
    })
}

fn deck_options_json() -> Value {
    json!({
        "id": 1,
        "name": "Default",
        "mod": 0,
        "usn": 0,
        "maxTaken": 60,
        "autoplay": true,
        "timer": 0,
        "replayq": true,
        "dyn": false,
        "new": {
            "bury": true,
            "delays": [1, 10],
            "initialFactor": 2500,
            "ints": [1, 4, 7],
            "order": 1,
            "perDay": 20,
            "separate": true
        },
        "lapse": {
            "delays": [10],
            "leechAction": 0,
            "leechFails": 8,
            "minInt": 1,
            "mult": 0
        },
        "rev": {
            "bury": true,
            "ease4": 1.3,
            "fuzz": 0.05,
            "ivlFct": 1,
            "maxIvl": 36500,
            "minSpace": 1,
            "perDay": 100
        }
    })
}
