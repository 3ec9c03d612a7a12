//! Command history with undo and redo

use tracing::info;

/// A reversible action
pub trait Command {
    type Error;

    /// Human readable summary, e.g. `"Activate fan_01"`
    fn description(&self) -> String;

    /// Perform the forward action
    fn execute(&self) -> Result<(), Self::Error>;

    /// Perform the inverse action
    fn undo(&self) -> Result<(), Self::Error>;
}

/// Executes commands and keeps them for undo/redo
///
/// History and redo stack never share a command. Executing a new command
/// clears the redo stack.
#[derive(Debug)]
pub struct CommandInvoker<C> {
    history: Vec<C>,
    redo_stack: Vec<C>,
}

impl<C> Default for CommandInvoker<C> {
    fn default() -> Self {
        Self {
            history: Vec::new(),
            redo_stack: Vec::new(),
        }
    }
}

impl<C: Command> CommandInvoker<C> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run a command and record it
    ///
    /// A command whose forward action fails is dropped, and the redo stack is
    /// left alone.
    pub fn execute(&mut self, command: C) -> Result<(), C::Error> {
        info!("Execute: {}", command.description());
        command.execute()?;
        self.history.push(command);
        self.redo_stack.clear();
        Ok(())
    }

    /// Reverse the most recent command
    ///
    /// Returns the description of the undone command, or `None` when there is
    /// nothing to undo. If the inverse action fails the command stays in
    /// history.
    pub fn undo(&mut self) -> Result<Option<String>, C::Error> {
        let Some(command) = self.history.pop() else {
            info!("Nothing to undo");
            return Ok(None);
        };

        let description = command.description();
        info!("Undo: {}", description);
        if let Err(e) = command.undo() {
            self.history.push(command);
            return Err(e);
        }

        self.redo_stack.push(command);
        Ok(Some(description))
    }

    /// Re-apply the most recently undone command
    ///
    /// Returns `None` when there is nothing to redo. If the forward action
    /// fails the command stays on the redo stack.
    pub fn redo(&mut self) -> Result<Option<String>, C::Error> {
        let Some(command) = self.redo_stack.pop() else {
            info!("Nothing to redo");
            return Ok(None);
        };

        let description = command.description();
        info!("Redo: {}", description);
        if let Err(e) = command.execute() {
            self.redo_stack.push(command);
            return Err(e);
        }

        self.history.push(command);
        Ok(Some(description))
    }

    /// The command `undo` would reverse next
    pub fn peek_undo(&self) -> Option<&C> {
        self.history.last()
    }

    /// The command `redo` would re-apply next
    pub fn peek_redo(&self) -> Option<&C> {
        self.redo_stack.last()
    }

    /// Descriptions of executed commands, oldest first
    pub fn history(&self) -> Vec<String> {
        self.history.iter().map(|c| c.description()).collect()
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    pub fn redo_len(&self) -> usize {
        self.redo_stack.len()
    }

    pub fn can_undo(&self) -> bool {
        !self.history.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Forget all history and redo entries
    pub fn clear(&mut self) {
        self.history.clear();
        self.redo_stack.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    /// Adds `amount` to a shared counter; fails when the counter would pass `limit`
    struct Add {
        counter: Rc<Cell<i32>>,
        amount: i32,
        limit: i32,
    }

    impl Command for Add {
        type Error = String;

        fn description(&self) -> String {
            format!("Add {}", self.amount)
        }

        fn execute(&self) -> Result<(), String> {
            let next = self.counter.get() + self.amount;
            if next > self.limit {
                return Err(format!("limit {} exceeded", self.limit));
            }
            self.counter.set(next);
            Ok(())
        }

        fn undo(&self) -> Result<(), String> {
            self.counter.set(self.counter.get() - self.amount);
            Ok(())
        }
    }

    fn add(counter: &Rc<Cell<i32>>, amount: i32) -> Add {
        Add {
            counter: counter.clone(),
            amount,
            limit: i32::MAX,
        }
    }

    #[test]
    fn test_execute_records_history() {
        let counter = Rc::new(Cell::new(0));
        let mut invoker = CommandInvoker::new();

        invoker.execute(add(&counter, 1)).unwrap();
        invoker.execute(add(&counter, 2)).unwrap();

        assert_eq!(counter.get(), 3);
        assert_eq!(invoker.history(), vec!["Add 1", "Add 2"]);
        assert!(invoker.can_undo());
        assert!(!invoker.can_redo());
    }

    #[test]
    fn test_n_executes_then_n_undos_restore() {
        let counter = Rc::new(Cell::new(10));
        let mut invoker = CommandInvoker::new();

        for amount in 1..=5 {
            invoker.execute(add(&counter, amount)).unwrap();
        }
        for _ in 0..5 {
            assert!(invoker.undo().unwrap().is_some());
        }

        assert_eq!(counter.get(), 10);
        assert_eq!(invoker.history_len(), 0);
        assert_eq!(invoker.redo_len(), 5);
    }

    #[test]
    fn test_undo_then_redo() {
        let counter = Rc::new(Cell::new(0));
        let mut invoker = CommandInvoker::new();
        invoker.execute(add(&counter, 4)).unwrap();

        assert_eq!(invoker.peek_undo().map(|c| c.amount), Some(4));
        assert_eq!(invoker.undo().unwrap(), Some("Add 4".to_string()));
        assert!(invoker.peek_undo().is_none());
        assert_eq!(invoker.peek_redo().map(|c| c.amount), Some(4));
        assert_eq!(counter.get(), 0);
        assert_eq!(invoker.redo().unwrap(), Some("Add 4".to_string()));
        assert_eq!(counter.get(), 4);
        assert_eq!(invoker.history_len(), 1);
    }

    #[test]
    fn test_execute_clears_redo() {
        let counter = Rc::new(Cell::new(0));
        let mut invoker = CommandInvoker::new();
        invoker.execute(add(&counter, 1)).unwrap();
        invoker.undo().unwrap();

        invoker.execute(add(&counter, 7)).unwrap();
        assert_eq!(invoker.redo().unwrap(), None);
        assert_eq!(counter.get(), 7);
        assert_eq!(invoker.history(), vec!["Add 7"]);
    }

    #[test]
    fn test_empty_stacks_are_noops() {
        let mut invoker: CommandInvoker<Add> = CommandInvoker::new();
        assert_eq!(invoker.undo().unwrap(), None);
        assert_eq!(invoker.redo().unwrap(), None);
    }

    #[test]
    fn test_failed_execute_not_recorded() {
        let counter = Rc::new(Cell::new(0));
        let mut invoker = CommandInvoker::new();
        invoker.execute(add(&counter, 1)).unwrap();
        invoker.undo().unwrap();

        let result = invoker.execute(Add {
            counter: counter.clone(),
            amount: 5,
            limit: 3,
        });

        assert!(result.is_err());
        assert_eq!(invoker.history_len(), 0);
        assert_eq!(invoker.redo_len(), 1);
    }

    #[test]
    fn test_failed_redo_stays_on_stack() {
        let counter = Rc::new(Cell::new(0));
        let mut invoker = CommandInvoker::new();
        invoker
            .execute(Add {
                counter: counter.clone(),
                amount: 2,
                limit: 2,
            })
            .unwrap();
        invoker.undo().unwrap();
        counter.set(1);

        assert!(invoker.redo().is_err());
        assert_eq!(invoker.redo_len(), 1);
        assert_eq!(invoker.history_len(), 0);
    }

    #[test]
    fn test_clear() {
        let counter = Rc::new(Cell::new(0));
        let mut invoker = CommandInvoker::new();
        invoker.execute(add(&counter, 1)).unwrap();
        invoker.execute(add(&counter, 1)).unwrap();
        invoker.undo().unwrap();

        invoker.clear();
        assert!(!invoker.can_undo());
        assert!(!invoker.can_redo());
    }
}
