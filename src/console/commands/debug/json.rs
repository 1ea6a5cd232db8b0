/// Points at the position reported by a JSON deserialize error.
pub struct JsonCommand {
    line: usize,
    column: usize,
    payload: String,
}

impl JsonCommand {
    pub fn new(line: usize, column: usize, payload: String) -> Self {
        Self {
            line,
            column,
            payload,
        }
    }

    fn locate(&self) -> Option<String> {
        let line = self.payload.lines().nth(self.line.checked_sub(1)?)?;
        let caret = " ".repeat(self.column.saturating_sub(1));
        Some(format!("{}\n{}^", line, caret))
    }
}

impl crate::console::commands::CallableTrait for JsonCommand {
    fn call(&self) -> Result<(), Box<dyn std::error::Error>> {
        match self.locate() {
            Some(context) => println!("{}", context),
            None => println!(
                "line {} column {} is outside of the payload",
                self.line, self.column
            ),
        }
        Ok(())
    }
}
