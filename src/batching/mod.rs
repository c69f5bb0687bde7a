pub mod debounce;
