//! Szenario-Tests ueber mehrere Geraete hinweg


mod nachrichten_tests;
