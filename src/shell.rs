//! Menu-driven session over one open store.
//!
//! Reads answers line by line from any `BufRead` and writes prompts and
//! results to any `Write`; end of input leaves the session.

use std::io::{self, BufRead, Write};

use crate::commands::{self, current_year, validate_month, validate_year, MIN_YEAR};
use crate::error::{Entity, LedgerError};
use crate::report::Renderer;
use crate::store::LedgerStore;

const CANCEL_WORDS: &[&str] = &["exit", "выход"];

enum Prompted<T> {
    Value(T),
    Cancelled,
}

pub struct Shell<'a, R, W> {
    store: &'a mut LedgerStore,
    renderer: Renderer,
    input: R,
    output: W,
}

impl<'a, R: BufRead, W: Write> Shell<'a, R, W> {
    pub fn new(store: &'a mut LedgerStore, date_format: &str, input: R, output: W) -> Self {
        Shell {
            store,
            renderer: Renderer::text(date_format),
            input,
            output,
        }
    }

    pub fn run(&mut self) -> io::Result<()> {
        loop {
            writeln!(self.output, "\nChoose an action:")?;
            writeln!(self.output, "1. Customers who ordered a product")?;
            writeln!(self.output, "2. Add/Remove/Change a contact person")?;
            writeln!(self.output, "3. Find the top customer")?;
            writeln!(self.output, "4. Exit")?;

            let Some(choice) = self.read_choice()? else {
                return Ok(());
            };

            match choice {
                1 => self.customers_by_product()?,
                2 => self.contact_menu()?,
                3 => self.top_customer()?,
                4 => return Ok(()),
                _ => writeln!(self.output, "Invalid choice. Please enter a number from 1 to 4.")?,
            }
        }
    }

    fn contact_menu(&mut self) -> io::Result<()> {
        loop {
            writeln!(self.output, "\nChoose an action:")?;
            writeln!(self.output, "1. Add a new contact")?;
            writeln!(self.output, "2. Remove a contact")?;
            writeln!(self.output, "3. Change a contact")?;
            writeln!(self.output, "4. Back to main menu")?;

            let Some(choice) = self.read_choice()? else {
                return Ok(());
            };

            match choice {
                1 => self.add_contact()?,
                2 => self.remove_contact()?,
                3 => self.change_contact()?,
                4 => return Ok(()),
                _ => writeln!(self.output, "Invalid choice. Please enter a number from 1 to 4.")?,
            }
        }
    }

    fn customers_by_product(&mut self) -> io::Result<()> {
        let Some(name) = self.prompt("Enter product name: ")? else {
            return Ok(());
        };

        let result = commands::customers_by_product(self.store, &self.renderer, &name);
        self.show(result)
    }

    fn top_customer(&mut self) -> io::Result<()> {
        let year_prompt = "Enter year (e.g. 2023) or 'exit' to cancel: ";
        let year = match self.prompt_valid(year_prompt, |text| {
            text.parse::<i32>().ok().and_then(|y| validate_year(y).ok())
        })? {
            Prompted::Value(year) => year,
            Prompted::Cancelled => return writeln!(self.output, "Cancelled."),
        };

        let month_prompt = "Enter month (e.g. 8) or 'exit' to cancel: ";
        let month = match self.prompt_valid(month_prompt, |text| {
            text.parse::<u32>().ok().and_then(|m| validate_month(m).ok())
        })? {
            Prompted::Value(month) => month,
            Prompted::Cancelled => return writeln!(self.output, "Cancelled."),
        };

        let result = commands::top_customer(self.store, &self.renderer, year, month);
        self.show(result)
    }

    fn add_contact(&mut self) -> io::Result<()> {
        self.show_contacts()?;

        let Some(contact) = self.prompt("Enter the new contact person's full name: ")? else {
            return Ok(());
        };

        // Refuse early, before asking for the organization
        if self.store.customers().by_contact_person(&contact).is_some() {
            let err = LedgerError::DuplicateContact(contact);
            return writeln!(self.output, "{}", self.renderer.error(&err));
        }

        let Some(organization) = self.prompt("Enter the organization name: ")? else {
            return Ok(());
        };

        let result = commands::add_contact(self.store, &self.renderer, &contact, &organization);
        self.show(result)
    }

    fn remove_contact(&mut self) -> io::Result<()> {
        self.show_contacts()?;

        let Some(contact) = self.prompt("Enter the full name of the contact to remove: ")? else {
            return Ok(());
        };

        let result = commands::remove_contact(self.store, &self.renderer, &contact);
        self.show(result)
    }

    fn change_contact(&mut self) -> io::Result<()> {
        self.show_contacts()?;

        let Some(current) = self.prompt("Enter the current contact person's full name: ")? else {
            return Ok(());
        };
        let Some(new) = self.prompt("Enter the new contact person's full name: ")? else {
            return Ok(());
        };

        let result = commands::change_contact(self.store, &self.renderer, &current, &new);
        let changed = result.is_ok();
        self.show(result)?;

        if changed {
            writeln!(self.output, "All customers after the change:")?;
            self.show_contacts()?;
        }
        Ok(())
    }

    fn show_contacts(&mut self) -> io::Result<()> {
        writeln!(self.output, "All contact persons:")?;
        let result = commands::list_contacts(self.store, &self.renderer);
        self.show(result)
    }

    fn show(&mut self, result: Result<String, LedgerError>) -> io::Result<()> {
        let text = match result {
            Ok(text) => text,
            Err(LedgerError::NotFound {
                entity: Entity::OrdersInPeriod,
                ..
            }) => "No orders for the given period.".to_string(),
            Err(e) => self.renderer.error(&e),
        };
        writeln!(self.output, "{}", text.trim_end())
    }

    /// Next trimmed line; `None` at end of input
    fn read_line(&mut self) -> io::Result<Option<String>> {
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }

    fn read_choice(&mut self) -> io::Result<Option<u32>> {
        Ok(self
            .read_line()?
            .map(|line| line.parse::<u32>().unwrap_or(0)))
    }

    fn prompt(&mut self, text: &str) -> io::Result<Option<String>> {
        write!(self.output, "{}", text)?;
        self.output.flush()?;
        self.read_line()
    }

    /// Ask until `parse` accepts the answer; a cancel word or end of input gives up
    fn prompt_valid<T>(
        &mut self,
        text: &str,
        parse: impl Fn(&str) -> Option<T>,
    ) -> io::Result<Prompted<T>> {
        loop {
            let Some(answer) = self.prompt(text)? else {
                return Ok(Prompted::Cancelled);
            };

            if CANCEL_WORDS.iter().any(|w| answer.to_lowercase() == *w) {
                return Ok(Prompted::Cancelled);
            }

            if let Some(value) = parse(&answer) {
                return Ok(Prompted::Value(value));
            }

            writeln!(
                self.output,
                "Invalid value. Year must be {}..={}, month 1..=12.",
                MIN_YEAR,
                current_year()
            )?;
        }
    }
}
