use anyhow::{anyhow, Result};
use chrono::NaiveDate;
use gameshelf_core::{
    import::{parse_date, split_tags},
    library::Action,
    models::{Game, GameDraft, GameStatus, Score, Status, MAX_COMMENT_LEN},
};

const MAX_LINE_LEN: usize = 200;

/// Single-line text field. The cursor is a character index.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextInput {
    input: String,
    cursor: usize,
    limit: usize,
}

impl TextInput {
    pub fn new(initial: impl Into<String>) -> Self {
        Self::with_limit(initial, MAX_LINE_LEN)
    }

    /// `limit` caps typing only; a longer `initial` value is kept whole.
    pub fn with_limit(initial: impl Into<String>, limit: usize) -> Self {
        let input: String = initial.into();
        let cursor = input.chars().count();
        Self {
            input,
            cursor,
            limit,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.input
    }

    pub fn trimmed(&self) -> &str {
        self.input.trim()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.input.chars().count()
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn move_cursor(&mut self, delta: isize) {
        let len = self.len() as isize;
        self.cursor = (self.cursor as isize + delta).clamp(0, len) as usize;
    }

    pub fn move_home(&mut self) {
        self.cursor = 0;
    }

    pub fn move_end(&mut self) {
        self.cursor = self.len();
    }

    pub fn insert(&mut self, ch: char) {
        if ch.is_control() || self.len() >= self.limit {
            return;
        }
        let at = self.byte_offset(self.cursor);
        self.input.insert(at, ch);
        self.cursor += 1;
    }

    pub fn backspace(&mut self) {
        if self.cursor == 0 {
            return;
        }
        self.cursor -= 1;
        let at = self.byte_offset(self.cursor);
        self.input.remove(at);
    }

    pub fn delete(&mut self) {
        if self.cursor < self.len() {
            let at = self.byte_offset(self.cursor);
            self.input.remove(at);
        }
    }

    fn byte_offset(&self, chars: usize) -> usize {
        self.input
            .char_indices()
            .nth(chars)
            .map(|(idx, _)| idx)
            .unwrap_or(self.input.len())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorField {
    Title,
    Platform,
    Status,
    Score,
    Tags,
    Completed,
    Release,
    Cover,
    Comments,
}

impl EditorField {
    pub const ALL: [EditorField; 9] = [
        EditorField::Title,
        EditorField::Platform,
        EditorField::Status,
        EditorField::Score,
        EditorField::Tags,
        EditorField::Completed,
        EditorField::Release,
        EditorField::Cover,
        EditorField::Comments,
    ];

    pub fn label(self) -> &'static str {
        match self {
            EditorField::Title => "Title",
            EditorField::Platform => "Platform",
            EditorField::Status => "Status",
            EditorField::Score => "Score (0-10)",
            EditorField::Tags => "Tags",
            EditorField::Completed => "Completed on",
            EditorField::Release => "Release date",
            EditorField::Cover => "Cover URL",
            EditorField::Comments => "Comments",
        }
    }
}

/// Add/edit form for one record.
#[derive(Debug, Clone)]
pub struct RecordEditor {
    id: Option<u64>,
    focus: usize,
    status: GameStatus,
    title: TextInput,
    platform: TextInput,
    score: TextInput,
    tags: TextInput,
    completed: TextInput,
    release: TextInput,
    cover: TextInput,
    comments: TextInput,
}

impl RecordEditor {
    pub fn blank() -> Self {
        Self::from_draft(None, GameDraft::default())
    }

    pub fn for_game(game: &Game) -> Self {
        Self::from_draft(Some(game.id), GameDraft::from(game.clone()))
    }

    fn from_draft(id: Option<u64>, draft: GameDraft) -> Self {
        let date = |d: Option<NaiveDate>| d.map(|d| d.format("%Y-%m-%d").to_string());
        Self {
            id,
            focus: 0,
            status: draft.status.kind(),
            title: TextInput::new(draft.title),
            platform: TextInput::new(draft.platform.unwrap_or_default()),
            score: TextInput::new(draft.score.map(|s| s.to_string()).unwrap_or_default()),
            tags: TextInput::new(draft.tags.join(", ")),
            completed: TextInput::new(date(draft.status.completed_on()).unwrap_or_default()),
            release: TextInput::new(date(draft.release_date).unwrap_or_default()),
            cover: TextInput::new(draft.cover_image.unwrap_or_default()),
            comments: TextInput::with_limit(draft.comments, MAX_COMMENT_LEN),
        }
    }

    pub fn id(&self) -> Option<u64> {
        self.id
    }

    pub fn status(&self) -> GameStatus {
        self.status
    }

    pub fn focused(&self) -> EditorField {
        EditorField::ALL[self.focus]
    }

    /// Fields shown for the current status; the completion date only
    /// applies to finished records.
    pub fn fields(&self) -> Vec<EditorField> {
        EditorField::ALL
            .into_iter()
            .filter(|field| *field != EditorField::Completed || self.status == GameStatus::Finished)
            .collect()
    }

    pub fn move_focus(&mut self, delta: isize) {
        let fields = self.fields();
        let current = fields
            .iter()
            .position(|field| *field == self.focused())
            .unwrap_or(0) as isize;
        let len = fields.len() as isize;
        let next = fields[(current + delta).rem_euclid(len) as usize];
        self.focus = EditorField::ALL
            .iter()
            .position(|field| *field == next)
            .unwrap_or(0);
    }

    pub fn cycle_status(&mut self, forward: bool) {
        self.status = if forward {
            self.status.next()
        } else {
            let idx = GameStatus::ALL
                .iter()
                .position(|status| *status == self.status)
                .unwrap_or(0);
            GameStatus::ALL[(idx + GameStatus::ALL.len() - 1) % GameStatus::ALL.len()]
        };
    }

    pub fn input(&self, field: EditorField) -> Option<&TextInput> {
        match field {
            EditorField::Title => Some(&self.title),
            EditorField::Platform => Some(&self.platform),
            EditorField::Status => None,
            EditorField::Score => Some(&self.score),
            EditorField::Tags => Some(&self.tags),
            EditorField::Completed => Some(&self.completed),
            EditorField::Release => Some(&self.release),
            EditorField::Cover => Some(&self.cover),
            EditorField::Comments => Some(&self.comments),
        }
    }

    pub fn focused_input_mut(&mut self) -> Option<&mut TextInput> {
        match self.focused() {
            EditorField::Title => Some(&mut self.title),
            EditorField::Platform => Some(&mut self.platform),
            EditorField::Status => None,
            EditorField::Score => Some(&mut self.score),
            EditorField::Tags => Some(&mut self.tags),
            EditorField::Completed => Some(&mut self.completed),
            EditorField::Release => Some(&mut self.release),
            EditorField::Cover => Some(&mut self.cover),
            EditorField::Comments => Some(&mut self.comments),
        }
    }

    pub fn build(&self) -> Result<GameDraft> {
        let optional = |input: &TextInput| {
            let value = input.trimmed();
            (!value.is_empty()).then(|| value.to_string())
        };
        let date = |input: &TextInput, label: &str| -> Result<Option<NaiveDate>> {
            let raw = input.trimmed();
            if raw.is_empty() {
                return Ok(None);
            }
            parse_date(raw)
                .map(Some)
                .ok_or_else(|| anyhow!("{label}: \"{raw}\" is not a date"))
        };

        let score = match self.score.trimmed() {
            "" => None,
            raw => {
                let points: f64 = raw
                    .parse()
                    .map_err(|_| anyhow!("Score: \"{raw}\" is not a number"))?;
                Some(Score::new(points).ok_or_else(|| anyhow!("Score must be between 0 and 10"))?)
            }
        };

        let status = match self.status {
            GameStatus::Finished => Status::Finished {
                completed_on: date(&self.completed, "Completed on")?,
            },
            other => Status::from_kind(other),
        };

        Ok(GameDraft {
            title: self.title.trimmed().to_string(),
            platform: optional(&self.platform),
            cover_image: optional(&self.cover),
            status,
            tags: split_tags(self.tags.as_str()),
            score,
            release_date: date(&self.release, "Release date")?,
            comments: self.comments.trimmed().to_string(),
        })
    }

    /// The library edit this form describes.
    pub fn to_action(&self) -> Result<Action> {
        let draft = self.build()?;
        Ok(match self.id {
            Some(id) => Action::UpdateGame(draft.into_game(id)),
            None => Action::AddGame(draft),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_input_edits_at_cursor() {
        let mut input = TextInput::new("Pokémon");
        input.move_cursor(-2);
        input.insert('X');
        assert_eq!(input.as_str(), "PokémXon");
        input.backspace();
        input.backspace();
        assert_eq!(input.as_str(), "Pokéon");
        input.move_home();
        input.delete();
        assert_eq!(input.as_str(), "okéon");
        input.move_cursor(-10);
        assert_eq!(input.cursor(), 0);
        input.move_end();
        assert_eq!(input.cursor(), 5);
    }

    #[test]
    fn text_input_respects_limit() {
        let mut input = TextInput::with_limit("a".repeat(MAX_COMMENT_LEN - 1), MAX_COMMENT_LEN);
        input.insert('b');
        assert_eq!(input.len(), MAX_COMMENT_LEN);
        input.insert('c');
        assert_eq!(input.len(), MAX_COMMENT_LEN);
        input.backspace();
        input.insert('\n');
        assert_eq!(input.len(), MAX_COMMENT_LEN - 1);
    }

    #[test]
    fn long_stored_values_survive_an_unchanged_save() -> Result<()> {
        let cover = format!("https://images.example.com/{}", "c".repeat(300));
        let title = "T".repeat(MAX_LINE_LEN + 20);
        let game = GameDraft {
            title: title.clone(),
            cover_image: Some(cover.clone()),
            ..GameDraft::default()
        }
        .into_game(3);

        let mut editor = RecordEditor::for_game(&game);
        let cover_input = editor.input(EditorField::Cover).map(TextInput::len);
        assert_eq!(cover_input, Some(cover.chars().count()));

        editor.focus = 0;
        if let Some(title_input) = editor.focused_input_mut() {
            title_input.insert('!');
            assert_eq!(title_input.len(), MAX_LINE_LEN + 20);
        }

        match editor.to_action()? {
            Action::UpdateGame(saved) => {
                assert_eq!(saved.title, title);
                assert_eq!(saved.cover_image.as_deref(), Some(cover.as_str()));
            }
            other => panic!("unexpected action {other:?}"),
        }
        Ok(())
    }

    #[test]
    fn completed_date_only_offered_when_finished() {
        let mut editor = RecordEditor::blank();
        assert!(!editor.fields().contains(&EditorField::Completed));
        while editor.status() != GameStatus::Finished {
            editor.cycle_status(true);
        }
        assert!(editor.fields().contains(&EditorField::Completed));

        editor.focus = 4;
        editor.move_focus(1);
        assert_eq!(editor.focused(), EditorField::Completed);
        editor.move_focus(-3);
        assert_eq!(editor.focused(), EditorField::Status);
        editor.cycle_status(true);
        editor.move_focus(3);
        assert_eq!(editor.focused(), EditorField::Release);
    }

    #[test]
    fn builds_update_for_existing_game() -> Result<()> {
        let game = GameDraft {
            title: "Hades".to_string(),
            status: Status::Finished {
                completed_on: NaiveDate::from_ymd_opt(2023, 5, 1),
            },
            tags: vec!["Indie".to_string()],
            score: Score::new(9.5),
            ..GameDraft::default()
        }
        .into_game(7);

        let mut editor = RecordEditor::for_game(&game);
        assert_eq!(editor.input(EditorField::Score).map(TextInput::as_str), Some("9.5"));
        assert_eq!(
            editor.input(EditorField::Completed).map(TextInput::as_str),
            Some("2023-05-01")
        );

        editor.focus = 4;
        if let Some(tags) = editor.focused_input_mut() {
            tags.move_end();
            for ch in ", Roguelike".chars() {
                tags.insert(ch);
            }
        }
        match editor.to_action()? {
            Action::UpdateGame(updated) => {
                assert_eq!(updated.id, 7);
                assert_eq!(updated.tags, vec!["Indie", "Roguelike"]);
                assert_eq!(
                    updated.status.completed_on(),
                    NaiveDate::from_ymd_opt(2023, 5, 1)
                );
            }
            other => panic!("unexpected action {other:?}"),
        }
        Ok(())
    }

    #[test]
    fn rejects_bad_score_and_date() {
        let mut editor = RecordEditor::blank();
        editor.score = TextInput::new("11");
        assert!(editor.build().is_err());
        editor.score = TextInput::new("7.3");
        assert_eq!(editor.build().ok().and_then(|d| d.score), Score::new(7.5));
        editor.release = TextInput::new("someday");
        assert!(editor.build().is_err());
    }

    #[test]
    fn status_change_drops_completion_date() -> Result<()> {
        let game = GameDraft {
            title: "Celeste".to_string(),
            status: Status::Finished {
                completed_on: NaiveDate::from_ymd_opt(2022, 1, 1),
            },
            ..GameDraft::default()
        }
        .into_game(1);
        let mut editor = RecordEditor::for_game(&game);
        editor.cycle_status(true);
        let draft = editor.build()?;
        assert_eq!(draft.status, Status::Backlog);
        assert_eq!(draft.status.completed_on(), None);
        Ok(())
    }
}
