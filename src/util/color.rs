const SECTION: char = '\u{a7}';

pub trait Color {
    fn colored(&self) -> String;

    fn stripped(&self) -> String;
}

impl<T: AsRef<str> + ?Sized> Color for T {
    fn colored(&self) -> String {
        let mut out = String::with_capacity(self.as_ref().len());
        let mut chars = self.as_ref().chars().peekable();

        while let Some(c) = chars.next() {
            match chars.peek() {
                Some(&code) if c == '&' && is_code(code) => out.push(SECTION),
                _ => out.push(c),
            }
        }

        out
    }

    fn stripped(&self) -> String {
        let mut out = String::with_capacity(self.as_ref().len());
        let mut chars = self.as_ref().chars();

        while let Some(c) = chars.next() {
            if c == SECTION {
                chars.next();
            } else {
                out.push(c);
            }
        }

        out
    }
}

fn is_code(c: char) -> bool {
    matches!(c.to_ascii_lowercase(), '0'..='9' | 'a'..='f' | 'k'..='o' | 'r')
}
