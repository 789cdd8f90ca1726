mod roster_entry;
