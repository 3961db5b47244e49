use crate::client::Draft;
use crate::errors::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Title,
    Description,
    Sql,
    Tags,
    Author,
}

impl Field {
    pub const ALL: [Field; 5] = [
        Field::Title,
        Field::Description,
        Field::Sql,
        Field::Tags,
        Field::Author,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Field::Title => "Title *",
            Field::Description => "Description",
            Field::Sql => "SQL *",
            Field::Tags => "Tags (comma separated)",
            Field::Author => "Author",
        }
    }

    fn index(&self) -> usize {
        Field::ALL.iter().position(|f| f == self).unwrap_or(0)
    }
}

/// Input state of the add view.
#[derive(Debug)]
pub struct AddForm {
    pub title: String,
    pub description: String,
    pub sql: String,
    pub tags: String,
    pub author: String,
    pub focus: Field,
}

impl Default for AddForm {
    fn default() -> Self {
        Self {
            title: String::new(),
            description: String::new(),
            sql: String::new(),
            tags: String::new(),
            author: String::new(),
            focus: Field::Title,
        }
    }
}

impl AddForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn value(&self, field: Field) -> &str {
        match field {
            Field::Title => &self.title,
            Field::Description => &self.description,
            Field::Sql => &self.sql,
            Field::Tags => &self.tags,
            Field::Author => &self.author,
        }
    }

    fn focused_mut(&mut self) -> &mut String {
        match self.focus {
            Field::Title => &mut self.title,
            Field::Description => &mut self.description,
            Field::Sql => &mut self.sql,
            Field::Tags => &mut self.tags,
            Field::Author => &mut self.author,
        }
    }

    pub fn next_field(&mut self) {
        let i = (self.focus.index() + 1) % Field::ALL.len();
        self.focus = Field::ALL[i];
    }

    pub fn prev_field(&mut self) {
        let n = Field::ALL.len();
        let i = (self.focus.index() + n - 1) % n;
        self.focus = Field::ALL[i];
    }

    pub fn input(&mut self, c: char) {
        self.focused_mut().push(c);
    }

    /// Only the SQL field is multi-line.
    pub fn newline(&mut self) {
        if self.focus == Field::Sql {
            self.sql.push('\n');
        }
    }

    pub fn backspace(&mut self) {
        self.focused_mut().pop();
    }

    /// Validates the form. A blank title or SQL keeps the input untouched so
    /// it can be corrected; otherwise the form is cleared and the draft
    /// returned for saving.
    pub fn submit(&mut self) -> Result<Draft> {
        let draft = Draft::parse(
            &self.title,
            &self.description,
            &self.sql,
            &self.tags,
            &self.author,
        )?;
        self.clear();
        Ok(draft)
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}
